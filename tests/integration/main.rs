//! Integration test suite: drives the real server over real sockets.


mod client_test;
mod health_test;
mod relay_test;
