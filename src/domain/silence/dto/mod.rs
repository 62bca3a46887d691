pub mod silence_payload;
