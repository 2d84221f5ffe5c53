//! Entity identifier newtypes.
//!
//! String-backed so they survive the flat-file format unchanged, with
//! [`BucketKey`] implemented by delegation so registries can key their
//! hash tables by id directly.

use mediq_containers::BucketKey;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl BucketKey for $name {
            fn bucket_code(&self) -> u64 {
                BucketKey::bucket_code(&self.0)
            }
        }
    };
}

id_type! {
    /// Identifier of a patient record (`P0001` style).
    PatientId
}

id_type! {
    /// Identifier of a doctor record (`D001` style).
    DoctorId
}

id_type! {
    /// Identifier of a clinic and of its scheduling queue (`C001` style).
    ClinicId
}
