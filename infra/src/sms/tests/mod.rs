//! Adapter tests. Gateways are third-party network services, so these
//! cover the pure pieces: config parsing, success sniffing, token expiry
//! decoding, and factory wiring. No network calls.

mod custom_http_tests;
mod vonage_tests;
