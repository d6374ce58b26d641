//! Random obligation networks for benches and stress runs.
