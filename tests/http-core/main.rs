#[cfg(feature = "http-full")]
mod h2;

#[macro_use]
#[cfg(feature = "http-full")]
mod support;

#[cfg(feature = "http-full")]
mod client;
#[cfg(feature = "http-full")]
mod integration;
#[cfg(feature = "http-full")]
mod server;

mod examples;
