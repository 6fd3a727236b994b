//
// CPAL-backed microphone capture.
//
// One Recorder owns one input stream on a dedicated worker thread. A
// start/stop gesture pair yields exactly one capture, or a CaptureError;
// chunks buffered for a previous gesture are cleared when a new one starts.

use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Sample, SampleFormat, SizedSample, Stream};

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("no input device found")]
    NoInputDevice,

    #[error("microphone access was denied")]
    PermissionDenied,

    #[error("failed to list input devices: {0}")]
    ListDevices(#[from] cpal::DevicesError),

    #[error("failed to get default config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("audio worker failed: {0}")]
    Worker(String),

    #[error("audio worker startup timeout")]
    WorkerTimeout,

    #[error("recording stop timed out")]
    StopTimeout,

    #[error("recording produced no audio")]
    EmptyCapture,

    #[error("recording already in progress")]
    AlreadyRecording,

    #[error("recording not started")]
    NotRecording,

    #[error("internal channel error")]
    Channel,
}

/// Lifecycle of one recording gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
    Stopping,
}

impl CaptureState {
    pub fn label(self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::Recording => "recording",
            CaptureState::Stopping => "stopping",
        }
    }
}

enum Cmd {
    Start,
    Stop(mpsc::Sender<Vec<f32>>),
    Shutdown,
}

enum WorkerMsg {
    Ready,
    Error(String),
}

pub struct Recorder {
    cmd_tx: mpsc::Sender<Cmd>,
    worker_handle: Option<std::thread::JoinHandle<()>>,
    sample_rate_hz: u32,
    state: Arc<Mutex<CaptureState>>,
}

impl Recorder {
    pub fn list_input_device_names() -> Result<Vec<String>, CaptureError> {
        let host = cpal::default_host();
        let mut out = Vec::new();
        for dev in host.input_devices()? {
            if let Ok(name) = dev.name() {
                out.push(name);
            }
        }
        out.sort();
        out.dedup();
        Ok(out)
    }

    /// Open the named input device, falling back to the platform default
    /// when the preference is absent or not found.
    pub fn open_named(device_name: Option<&str>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();

        if let Some(needle) = device_name {
            let needle = needle.trim();
            if !needle.is_empty() {
                if let Ok(devices) = host.input_devices() {
                    for dev in devices {
                        if let Ok(name) = dev.name() {
                            if name == needle {
                                log::info!("using input device: {name}");
                                return Self::open(Some(dev));
                            }
                        }
                    }
                }

                log::warn!("preferred input device not found, using default: {needle}");
            }
        }

        Self::open_default()
    }

    pub fn open_default() -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice)?;
        Self::open(Some(device))
    }

    pub fn open(device: Option<Device>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = match device {
            Some(d) => d,
            None => host
                .default_input_device()
                .ok_or(CaptureError::NoInputDevice)?,
        };

        // Capture at the device's native rate; resampling happens when the
        // artifact is encoded for upload.
        let default_cfg = device.default_input_config()?;
        let sample_rate_hz = default_cfg.sample_rate().0;

        let (chunk_tx, chunk_rx) = mpsc::channel::<Vec<f32>>();
        let (cmd_tx, cmd_rx) = mpsc::channel::<Cmd>();
        let (worker_tx, worker_rx) = mpsc::channel::<WorkerMsg>();

        let state = Arc::new(Mutex::new(CaptureState::Idle));
        let state_worker = state.clone();

        let worker_handle = std::thread::spawn(move || {
            let config = default_cfg;
            let sample_format = config.sample_format();
            let channels = config.channels() as usize;

            let stream = match sample_format {
                SampleFormat::F32 => {
                    build_input_stream::<f32>(&device, &config.clone().into(), channels, chunk_tx)
                }
                SampleFormat::I16 => {
                    build_input_stream::<i16>(&device, &config.clone().into(), channels, chunk_tx)
                }
                SampleFormat::U16 => {
                    build_input_stream::<u16>(&device, &config.clone().into(), channels, chunk_tx)
                }
                SampleFormat::I8 => {
                    build_input_stream::<i8>(&device, &config.clone().into(), channels, chunk_tx)
                }
                SampleFormat::U8 => {
                    build_input_stream::<u8>(&device, &config.clone().into(), channels, chunk_tx)
                }
                SampleFormat::I32 => {
                    build_input_stream::<i32>(&device, &config.clone().into(), channels, chunk_tx)
                }
                SampleFormat::U32 => {
                    build_input_stream::<u32>(&device, &config.clone().into(), channels, chunk_tx)
                }
                SampleFormat::F64 => {
                    build_input_stream::<f64>(&device, &config.clone().into(), channels, chunk_tx)
                }
                _ => build_input_stream::<f32>(&device, &config.clone().into(), channels, chunk_tx),
            };

            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    let _ = worker_tx.send(WorkerMsg::Error(format!("build stream: {e}")));
                    log::error!("audio stream build failed: {e}");
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = worker_tx.send(WorkerMsg::Error(format!("play stream: {e}")));
                log::error!("audio stream play failed: {e}");
                return;
            }

            let _ = worker_tx.send(WorkerMsg::Ready);

            run_consumer(chunk_rx, cmd_rx, state_worker);
            drop(stream);
        });

        // Block briefly until the worker has either started the stream or failed.
        match worker_rx.recv_timeout(Duration::from_secs(2)) {
            Ok(WorkerMsg::Ready) => {}
            Ok(WorkerMsg::Error(e)) => return Err(classify_stream_error(&e)),
            Err(mpsc::RecvTimeoutError::Timeout) => return Err(CaptureError::WorkerTimeout),
            Err(_) => return Err(CaptureError::Channel),
        }

        Ok(Self {
            cmd_tx,
            worker_handle: Some(worker_handle),
            sample_rate_hz,
            state,
        })
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn state(&self) -> CaptureState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Begin a new gesture. Chunks from any prior gesture are dropped by the
    /// worker before buffering resumes.
    pub fn start(&self) -> Result<(), CaptureError> {
        if self.state() != CaptureState::Idle {
            return Err(CaptureError::AlreadyRecording);
        }

        self.cmd_tx
            .send(Cmd::Start)
            .map_err(|_| CaptureError::Channel)
    }

    /// Finish the gesture: wait for the worker's acknowledgment, then return
    /// the assembled samples. A silent gesture is an `EmptyCapture` error,
    /// never an empty artifact.
    pub fn stop(&self) -> Result<Vec<f32>, CaptureError> {
        if self.state() != CaptureState::Recording {
            return Err(CaptureError::NotRecording);
        }

        let (resp_tx, resp_rx) = mpsc::channel();
        self.cmd_tx
            .send(Cmd::Stop(resp_tx))
            .map_err(|_| CaptureError::Channel)?;

        let samples = resp_rx
            .recv_timeout(Duration::from_secs(3))
            .map_err(|e| match e {
                mpsc::RecvTimeoutError::Timeout => CaptureError::StopTimeout,
                mpsc::RecvTimeoutError::Disconnected => CaptureError::Channel,
            })?;

        assemble_capture(samples)
    }

    pub fn close(mut self) -> Result<(), CaptureError> {
        let _ = self.cmd_tx.send(Cmd::Shutdown);
        if let Some(h) = self.worker_handle.take() {
            let _ = h.join();
        }
        Ok(())
    }
}

fn assemble_capture(samples: Vec<f32>) -> Result<Vec<f32>, CaptureError> {
    if samples.is_empty() {
        return Err(CaptureError::EmptyCapture);
    }
    Ok(samples)
}

fn classify_stream_error(msg: &str) -> CaptureError {
    let lower = msg.to_ascii_lowercase();
    if lower.contains("permission")
        || lower.contains("access denied")
        || lower.contains("not authorized")
    {
        CaptureError::PermissionDenied
    } else if lower.contains("not available") || lower.contains("no input device") {
        CaptureError::NoInputDevice
    } else {
        CaptureError::Worker(msg.to_string())
    }
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    chunk_tx: mpsc::Sender<Vec<f32>>,
) -> Result<Stream, cpal::BuildStreamError>
where
    T: Sample + SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let cb = move |data: &[T], _: &cpal::InputCallbackInfo| {
        let chunk: Vec<f32> = if channels == 1 {
            data.iter().map(|&s| s.to_sample::<f32>()).collect()
        } else {
            data.chunks_exact(channels)
                .map(|frame| {
                    frame.iter().map(|&s| s.to_sample::<f32>()).sum::<f32>() / channels as f32
                })
                .collect()
        };

        let _ = chunk_tx.send(chunk);
    };

    device.build_input_stream(
        config,
        cb,
        |err| {
            // Surfacing these is the only way to debug "recording but silent".
            log::error!("audio stream error: {err}");
        },
        None,
    )
}

fn run_consumer(
    chunk_rx: mpsc::Receiver<Vec<f32>>,
    cmd_rx: mpsc::Receiver<Cmd>,
    state: Arc<Mutex<CaptureState>>,
) {
    let set_state = |next: CaptureState| {
        *state.lock().unwrap_or_else(|p| p.into_inner()) = next;
    };

    let mut chunks: Vec<Vec<f32>> = Vec::new();
    let mut recording = false;

    loop {
        // Always drain commands promptly, even if the stream is stalled.
        while let Ok(cmd) = cmd_rx.try_recv() {
            match cmd {
                Cmd::Start => {
                    chunks.clear();
                    recording = true;
                    set_state(CaptureState::Recording);
                }
                Cmd::Stop(resp) => {
                    set_state(CaptureState::Stopping);
                    recording = false;

                    let total: usize = chunks.iter().map(Vec::len).sum();
                    let mut out = Vec::with_capacity(total);
                    for chunk in chunks.drain(..) {
                        out.extend_from_slice(&chunk);
                    }

                    let _ = resp.send(out);
                    set_state(CaptureState::Idle);
                }
                Cmd::Shutdown => return,
            }
        }

        match chunk_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(chunk) => {
                if recording {
                    chunks.push(chunk);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // No audio chunk yet; loop around to check commands again.
                continue;
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_consumer() -> (
        mpsc::Sender<Vec<f32>>,
        mpsc::Sender<Cmd>,
        Arc<Mutex<CaptureState>>,
        std::thread::JoinHandle<()>,
    ) {
        let (chunk_tx, chunk_rx) = mpsc::channel();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let state = Arc::new(Mutex::new(CaptureState::Idle));
        let state_worker = state.clone();
        let handle = std::thread::spawn(move || run_consumer(chunk_rx, cmd_rx, state_worker));
        (chunk_tx, cmd_tx, state, handle)
    }

    fn stop_and_collect(cmd_tx: &mpsc::Sender<Cmd>) -> Vec<f32> {
        let (resp_tx, resp_rx) = mpsc::channel();
        cmd_tx.send(Cmd::Stop(resp_tx)).unwrap();
        resp_rx.recv_timeout(Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn buffers_chunks_only_while_recording() {
        let (chunk_tx, cmd_tx, state, handle) = spawn_consumer();

        // Chunks before the gesture starts are dropped.
        chunk_tx.send(vec![9.0; 4]).unwrap();
        std::thread::sleep(Duration::from_millis(150));

        cmd_tx.send(Cmd::Start).unwrap();
        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(
            *state.lock().unwrap_or_else(|p| p.into_inner()),
            CaptureState::Recording
        );

        chunk_tx.send(vec![0.1, 0.2]).unwrap();
        chunk_tx.send(vec![0.3]).unwrap();
        std::thread::sleep(Duration::from_millis(150));

        let out = stop_and_collect(&cmd_tx);
        assert_eq!(out, vec![0.1, 0.2, 0.3]);
        assert_eq!(
            *state.lock().unwrap_or_else(|p| p.into_inner()),
            CaptureState::Idle
        );

        cmd_tx.send(Cmd::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn a_new_gesture_never_mixes_in_prior_chunks() {
        let (chunk_tx, cmd_tx, _state, handle) = spawn_consumer();

        cmd_tx.send(Cmd::Start).unwrap();
        std::thread::sleep(Duration::from_millis(150));
        chunk_tx.send(vec![1.0]).unwrap();
        std::thread::sleep(Duration::from_millis(150));
        let first = stop_and_collect(&cmd_tx);
        assert_eq!(first, vec![1.0]);

        cmd_tx.send(Cmd::Start).unwrap();
        std::thread::sleep(Duration::from_millis(150));
        chunk_tx.send(vec![2.0]).unwrap();
        std::thread::sleep(Duration::from_millis(150));
        let second = stop_and_collect(&cmd_tx);
        assert_eq!(second, vec![2.0]);

        cmd_tx.send(Cmd::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn silent_gesture_is_an_empty_capture_error() {
        assert!(matches!(
            assemble_capture(Vec::new()),
            Err(CaptureError::EmptyCapture)
        ));
        assert_eq!(assemble_capture(vec![0.5]).unwrap(), vec![0.5]);
    }

    #[test]
    fn classifies_permission_shaped_failures() {
        assert!(matches!(
            classify_stream_error("build stream: Permission denied by the OS"),
            CaptureError::PermissionDenied
        ));
        assert!(matches!(
            classify_stream_error("build stream: the requested device is not available"),
            CaptureError::NoInputDevice
        ));
        assert!(matches!(
            classify_stream_error("something else"),
            CaptureError::Worker(_)
        ));
    }
}
