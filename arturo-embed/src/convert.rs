// arturo-embed - Value conversions for embedding
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! Conversions between Rust values and Arturo values.

use arturo_parser::ArturoVal;

/// Rust values that convert into Arturo values.
pub trait IntoArturoVal {
    fn into_arturo(self) -> ArturoVal;
}

impl IntoArturoVal for ArturoVal {
    fn into_arturo(self) -> ArturoVal {
        self
    }
}

impl IntoArturoVal for i64 {
    fn into_arturo(self) -> ArturoVal {
        ArturoVal::Integer(self)
    }
}

impl IntoArturoVal for f64 {
    fn into_arturo(self) -> ArturoVal {
        ArturoVal::Floating(self)
    }
}

impl IntoArturoVal for bool {
    fn into_arturo(self) -> ArturoVal {
        ArturoVal::Logical(self)
    }
}

impl IntoArturoVal for &str {
    fn into_arturo(self) -> ArturoVal {
        ArturoVal::string(self)
    }
}

impl IntoArturoVal for String {
    fn into_arturo(self) -> ArturoVal {
        ArturoVal::string(self)
    }
}

impl<T: IntoArturoVal> IntoArturoVal for Vec<T> {
    fn into_arturo(self) -> ArturoVal {
        ArturoVal::block(self.into_iter().map(IntoArturoVal::into_arturo).collect())
    }
}

/// Arturo values that convert back into Rust values.
pub trait FromArturoVal: Sized {
    fn from_arturo(value: &ArturoVal) -> Option<Self>;
}

impl FromArturoVal for i64 {
    fn from_arturo(value: &ArturoVal) -> Option<Self> {
        value.exact_i64()
    }
}

impl FromArturoVal for f64 {
    fn from_arturo(value: &ArturoVal) -> Option<Self> {
        value.as_f64()
    }
}

impl FromArturoVal for bool {
    fn from_arturo(value: &ArturoVal) -> Option<Self> {
        match value {
            ArturoVal::Logical(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromArturoVal for String {
    fn from_arturo(value: &ArturoVal) -> Option<Self> {
        match value {
            ArturoVal::String(s) => Some(s.to_string()),
            _ => None,
        }
    }
}

impl<T: FromArturoVal> FromArturoVal for Vec<T> {
    fn from_arturo(value: &ArturoVal) -> Option<Self> {
        match value {
            ArturoVal::Block(b) => b.items().iter().map(T::from_arturo).collect(),
            _ => None,
        }
    }
}
