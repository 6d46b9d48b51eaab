pub mod bad_channels;
