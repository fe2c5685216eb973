pub mod audit;
pub mod html;
pub mod json;
pub mod markdown;
