use std::sync::{
    mpsc::{self, Receiver, Sender},
    Mutex,
};
use std::thread;
use std::time::Duration;

use log::warn;
use rodio::{OutputStream, OutputStreamHandle, Sink};

use crate::utils::lock;

use super::tone::Beep;

enum BeepCommand {
    Play { frequency: f32, duration: Duration },
    Silence,
}

/// Owns the output device on its own thread; `OutputStream` is not `Send`.
/// The thread starts on the first beep.
pub struct BeepEngineHandle {
    tx: Mutex<Option<Sender<BeepCommand>>>,
}

impl BeepEngineHandle {
    pub fn new() -> Self {
        Self {
            tx: Mutex::new(None),
        }
    }

    pub fn beep(&self, frequency: f32, duration: Duration) -> Result<(), String> {
        self.sender()?
            .send(BeepCommand::Play {
                frequency,
                duration,
            })
            .map_err(|_| "audio thread has exited".to_string())
    }

    pub fn stop(&self) {
        if let Some(tx) = lock(&self.tx).as_ref() {
            let _ = tx.send(BeepCommand::Silence);
        }
    }

    fn sender(&self) -> Result<Sender<BeepCommand>, String> {
        let mut slot = lock(&self.tx);
        if let Some(tx) = slot.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("scan-beep".to_string())
            .spawn(move || beep_thread(rx))
            .map_err(|err| format!("Failed to spawn audio thread: {err}"))?;
        *slot = Some(tx.clone());
        Ok(tx)
    }
}

fn beep_thread(rx: Receiver<BeepCommand>) {
    // Opened lazily and reopened after Silence so an unplugged device can recover.
    let mut output: Option<(OutputStream, Sink)> = None;

    while let Ok(command) = rx.recv() {
        match command {
            BeepCommand::Play {
                frequency,
                duration,
            } => {
                if output.is_none() {
                    match open_output() {
                        Ok(opened) => output = Some(opened),
                        Err(err) => {
                            warn!("audio cue skipped: {err}");
                            continue;
                        }
                    }
                }
                if let Some((_, sink)) = &output {
                    sink.append(Beep::new(frequency, duration));
                }
            }
            BeepCommand::Silence => {
                if let Some((_stream, sink)) = output.take() {
                    sink.stop();
                }
            }
        }
    }
}

fn open_output() -> Result<(OutputStream, Sink), String> {
    let (stream, handle): (OutputStream, OutputStreamHandle) = OutputStream::try_default()
        .map_err(|err| format!("no audio output device: {err}"))?;
    let sink = Sink::try_new(&handle).map_err(|err| format!("audio sink unavailable: {err}"))?;
    Ok((stream, sink))
}

impl Drop for BeepEngineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
