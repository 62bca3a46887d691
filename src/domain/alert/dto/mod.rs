pub mod alerts_response;
