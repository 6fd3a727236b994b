pub mod artifact;
pub mod capture;
pub mod resample;

pub use artifact::{CapturedAudio, UPLOAD_MIME_TYPE, UPLOAD_SAMPLE_RATE_HZ, encode_wav_16k};
pub use capture::{CaptureError, CaptureState, Recorder};
