#[cfg(feature = "desktop")]
mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::SessionConfig;
pub use error::{AppError, CaptionError};
pub use services::caption::session::{CaptionSession, SessionObserver};

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use commands::caption::EventObserver;
    use services::caption::impl_fake::FakeClassifier;
    use std::sync::Arc;
    use tauri::{DragDropEvent, Manager, WindowEvent};

    tauri::Builder::default()
        .plugin(
            tauri_plugin_log::Builder::default()
                .level(log::LevelFilter::Info)
                .build(),
        )
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let config_path = app.path().app_config_dir()?.join(config::CONFIG_FILE_NAME);
            let config = SessionConfig::load_or_default(&config_path);
            let use_fake_classifier = config.use_fake_classifier;

            let mut session = CaptionSession::new(config)
                .with_observer(Arc::new(EventObserver::new(app.handle().clone())));
            if use_fake_classifier {
                log::info!("Using the built-in demo classifier");
                session = session.with_backend(Arc::new(FakeClassifier::demo()));
            }
            app.manage(session);

            Ok(())
        })
        .on_window_event(|window, event| {
            // Only the first dropped file is used
            if let WindowEvent::DragDrop(DragDropEvent::Drop { paths, .. }) = event {
                let Some(path) = paths.first().cloned() else {
                    return;
                };
                if let Some(session) = window.try_state::<CaptionSession>() {
                    let session = session.inner().clone();
                    tauri::async_runtime::spawn(async move {
                        let _ = session.load_from_path(&path).await;
                    });
                }
            }
        })
        .invoke_handler(tauri::generate_handler![
            commands::caption::get_session_view,
            commands::caption::get_model_status,
            commands::caption::load_image_file,
            commands::caption::load_image_url,
            commands::caption::load_demo_image,
            commands::caption::generate_caption,
            commands::caption::reset_preview,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
