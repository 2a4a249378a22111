pub mod gemini;

pub use gemini::send_generate_request;
