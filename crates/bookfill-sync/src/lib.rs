//! Upstream metadata lookup clients: Kakao book search and Aladin TTB.

mod error;
pub use error::LookupError;

pub mod aladin;
pub mod kakao;

pub use aladin::{AladinClient, NumericId};
pub use kakao::KakaoClient;
