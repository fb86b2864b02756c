//! Benchmark harness for umbra; see `benches/`.
