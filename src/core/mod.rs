pub mod arranger;
pub mod audio;
pub mod dsp;
pub mod exporter;
pub mod reassembler;
pub mod slicer;
