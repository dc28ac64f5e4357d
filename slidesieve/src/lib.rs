pub mod embed;
pub mod enhance;
pub mod extract;
pub mod frame_source;
pub mod gate;
pub mod ocr;
pub mod pipeline;
pub mod sink;
pub mod summarize;
