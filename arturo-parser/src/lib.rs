// arturo-parser - Lexer and parser for the Arturo programming language
// Copyright (c) 2026 The Arturo Project Contributors. MIT licensed.

//! # arturo-parser
//!
//! Value model, lexer and parser for the Arturo programming language.
//! Produces `ArturoVal` trees from source code strings; the root of a parsed
//! program is itself a value, a `Block`.

pub mod codify;
pub mod lexer;
pub mod parser;
pub mod value;

pub use codify::codify;
pub use indexmap::IndexMap;
pub use lexer::{Lexer, LexerError, Token};
pub use num_bigint::BigInt;
pub use parser::{ParseError, Parser};
pub use value::{
    ArturoBlock, ArturoDict, ArturoObject, ArturoRegex, ArturoSymbol, ArturoVal, BuiltinRef,
    Color, DatabaseHandle, FunctionInfo, FunctionVal, KindSet, RangeVal, SocketHandle,
    StoreHandle, Translation, TypeVal, UserFunction, ValueKind, VersionVal, MAX_CONSTANTS,
};
