use std::sync::Arc;

use aria_app::backend::{HttpCompanionApi, HttpTranscriber};
use aria_app::config_store::ConfigStore;
use aria_app::service::{AppService, user_facing_capture_error};
use aria_app::speech::LogSpeech;
use aria_core::{EditOutcome, Sender, UserId};
use aria_engine::session::FinalizeOutcome;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config_path = std::env::var("ARIA_CONFIG")
        .unwrap_or_else(|_| "aria-config.json".into());
    let store = ConfigStore::at_path(config_path);
    let mut config = store.load_or_default()?;

    if let Ok(base_url) = std::env::var("ARIA_BASE_URL") {
        config.defaults.api_base_url = base_url;
    }
    let user_id = UserId::new(
        std::env::var("ARIA_USER_ID").unwrap_or_else(|_| "local-user".into()),
    );

    let base_url = config.defaults.api_base_url.clone();
    let svc = AppService::new(
        &config,
        user_id,
        Arc::new(HttpCompanionApi::new(base_url.clone())),
        Arc::new(HttpTranscriber::new(base_url)),
        Arc::new(LogSpeech::new()),
    );

    match svc.initialize().await {
        Ok(Some(welcome)) => println!("aria: {welcome}"),
        Ok(None) => println!("aria: (no welcome message)"),
        Err(e) => eprintln!("could not start a session: {e} (type something to retry)"),
    }

    println!("commands: /new  /speak  /record  /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut recording = false;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();

        match line.as_str() {
            "" => continue,
            "/quit" => break,
            "/new" => match svc.new_chat().await {
                Ok(FinalizeOutcome::NoChat) => {
                    // No chat bound yet; try to start one instead.
                    match svc.initialize().await {
                        Ok(Some(welcome)) => println!("aria: {welcome}"),
                        Ok(None) => {}
                        Err(e) => eprintln!("could not start a session: {e}"),
                    }
                }
                Ok(FinalizeOutcome::Reset { remote_error }) => {
                    match remote_error {
                        None => println!("chat finalized successfully"),
                        Some(e) => eprintln!("failed to finalize chat: {e}"),
                    }
                    if let Some(welcome) = svc.session().await.welcome {
                        println!("aria: {welcome}");
                    }
                }
                Err(e) => eprintln!("finalize rejected: {e}"),
            },
            "/speak" => {
                let enabled = !svc.voice_enabled().await;
                svc.set_voice_enabled(enabled).await;
                println!("voice output {}", if enabled { "on" } else { "off" });
            }
            "/record" => {
                if !recording {
                    match svc.start_recording().await {
                        Ok(()) => {
                            recording = true;
                            println!("recording... /record again to stop and send");
                        }
                        Err(e) => eprintln!("{}", user_facing_capture_error(&e)),
                    }
                } else {
                    recording = false;
                    match svc.stop_recording_and_send().await {
                        Ok(reply) => print_turn(&svc).await.unwrap_or_else(|| {
                            println!("aria: {reply}");
                        }),
                        Err(e) => eprintln!("voice input failed: {e:#}"),
                    }
                }
            }
            _ => {
                if svc.edit_compose(&line) == EditOutcome::Truncated {
                    eprintln!("word limit reached; only 200 words allowed");
                }

                match svc.send_composed().await {
                    Ok(_) => {
                        if print_turn(&svc).await.is_none() {
                            eprintln!("(no reply recorded)");
                        }
                    }
                    Err(e) => eprintln!("send failed: {e}"),
                }
            }
        }
    }

    Ok(())
}

/// Echo the latest exchange from the session history.
async fn print_turn(svc: &AppService) -> Option<()> {
    let session = svc.session().await;
    let pair = session.messages.len().checked_sub(2)?;

    for msg in &session.messages[pair..] {
        match msg.sender {
            Sender::User => println!("you:  {}", msg.text),
            Sender::Agent => println!("aria: {}", msg.text),
        }
    }
    Some(())
}
