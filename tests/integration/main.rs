mod cli;
mod examples;

#[cfg(all(feature = "http-full", feature = "boring", feature = "ua"))]
mod ua_emulation;

#[cfg(all(feature = "http-full", feature = "boring"))]
mod client;
