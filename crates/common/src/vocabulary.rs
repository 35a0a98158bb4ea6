/// Normalise a raw model-emitted token for vocabulary lookup:
/// case-insensitive, `_` and whitespace read as `-`.
pub(crate) fn canonical_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '_' | ' ' | '\t' => '-',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Declare a closed vocabulary as a string-backed enum.
///
/// Every generated enum gets an extra `Unknown` sentinel that is never produced
/// by strict `parse`, only by lenient normalization (or by deserializing a value
/// that was serialized as `"unknown"`).
macro_rules! define_vocabulary {
    ($name:ident, $doc:expr, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            /// Value outside the vocabulary, kept under the lenient record policy.
            Unknown,
        }

        impl $name {
            /// Every accepted value in declaration order. Excludes `Unknown`.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            const WIRE: &'static [&'static str] = &[$($wire),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Unknown => "unknown",
                }
            }

            /// Strict lookup. `None` for anything outside the vocabulary.
            pub fn parse(raw: &str) -> Option<Self> {
                let key = $crate::vocabulary::canonical_key(raw);
                Self::ALL.iter().copied().find(|v| v.as_str() == key)
            }

            /// Wire spellings, used when describing the output contract to the model.
            pub fn wire_values() -> &'static [&'static str] {
                Self::WIRE
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
                let raw = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                if $crate::vocabulary::canonical_key(&raw) == "unknown" {
                    return Ok(Self::Unknown);
                }
                Self::parse(&raw)
                    .ok_or_else(|| ::serde::de::Error::unknown_variant(&raw, Self::WIRE))
            }
        }
    };
}

pub(crate) use define_vocabulary;
