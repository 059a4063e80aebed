use std::{
    sync::mpsc::{self, Receiver, TryRecvError},
    time::Duration,
};

use eframe::egui::{self, Color32, RichText, TextEdit};
use hf_qa_http::{clean_text, EndpointConfig, QaClient, QueryRequest, QueryResult};

const SECRETS_FILE: &str = "secrets.json";

#[derive(Debug)]
enum LastOutcome {
    Answered(QueryResult),
    Failed(QueryResult),
    Blocked(String),
}

struct QaGuiApp {
    config: EndpointConfig,
    context: String,
    question: String,
    debug: bool,
    status: String,
    in_flight: bool,
    rx: Option<Receiver<Result<QueryResult, String>>>,
    last: Option<LastOutcome>,
}

impl QaGuiApp {
    fn new(config: EndpointConfig) -> Self {
        Self {
            config,
            context: String::new(),
            question: String::new(),
            debug: false,
            status: "Ready".to_owned(),
            in_flight: false,
            rx: None,
            last: None,
        }
    }
}

impl eframe::App for QaGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_response();

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.heading("AI-Powered Q&A Chatbot");
            ui.label("Ask questions based on a given context using the Hugging Face inference API.");
            ui.horizontal(|ui| {
                ui.label(format!("Model: {}", self.config.model()));
                ui.separator();
                ui.label(format!("Status: {}", self.status));
                if self.in_flight {
                    ui.spinner();
                }
            });
        });

        egui::SidePanel::left("settings").show(ctx, |ui| {
            ui.heading("Settings");
            ui.checkbox(&mut self.debug, "Debug Info");
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.config.has_credential() {
                ui.colored_label(
                    Color32::from_rgb(200, 140, 20),
                    "Hugging Face token not found. Set HF_TOKEN in the environment or secrets.json.",
                );
                ui.separator();
            }

            ui.label("Enter the context (paragraph or document):");
            ui.add(
                TextEdit::multiline(&mut self.context)
                    .desired_rows(10)
                    .desired_width(f32::INFINITY),
            );
            ui.label("Ask your question:");
            ui.add(TextEdit::singleline(&mut self.question).desired_width(f32::INFINITY));

            if ui
                .add_enabled(!self.in_flight, egui::Button::new("Get Answer"))
                .clicked()
            {
                self.run_question_async();
            }

            ui.separator();
            self.render_outcome_ui(ui);
        });

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

impl QaGuiApp {
    fn render_outcome_ui(&self, ui: &mut egui::Ui) {
        match &self.last {
            Some(LastOutcome::Answered(result)) => {
                ui.label(
                    RichText::new(format!("Answer: {}", clean_text(&result.answer)))
                        .color(Color32::from_rgb(35, 120, 35))
                        .strong(),
                );
                if let Some(percent) = result.confidence_percent() {
                    ui.small(format!("Confidence: {percent:.0}%"));
                }
            }
            Some(LastOutcome::Failed(result)) => {
                ui.colored_label(
                    Color32::from_rgb(215, 40, 40),
                    format!("Failed: {}", result.error.as_deref().unwrap_or("unknown error")),
                );
                if self.debug {
                    ui.monospace(format!("Status: {:?}", result.status_code));
                }
            }
            Some(LastOutcome::Blocked(message)) => {
                ui.colored_label(Color32::from_rgb(215, 40, 40), message);
            }
            None => {
                ui.label("No answer yet.");
            }
        }
    }

    fn run_question_async(&mut self) {
        let request = QueryRequest::new(self.question.clone(), self.context.clone());
        if let Err(err) = request.validate() {
            self.last = Some(LastOutcome::Blocked(err.to_string()));
            return;
        }

        self.status = "Generating answer...".to_owned();
        self.in_flight = true;
        self.last = None;

        let (tx, rx) = mpsc::channel();
        self.rx = Some(rx);
        let config = self.config.clone();

        std::thread::spawn(move || {
            let response = run_question_request(config, request);
            let _ = tx.send(response);
        });
    }

    fn poll_response(&mut self) {
        let Some(rx) = &self.rx else {
            return;
        };

        match rx.try_recv() {
            Ok(message) => {
                self.in_flight = false;
                self.rx = None;
                self.last = Some(match message {
                    Ok(result) if result.ok => {
                        self.status = "Answered".to_owned();
                        LastOutcome::Answered(result)
                    }
                    Ok(result) => {
                        self.status = "Question failed".to_owned();
                        LastOutcome::Failed(result)
                    }
                    Err(err) => {
                        self.status = "Not configured".to_owned();
                        LastOutcome::Blocked(err)
                    }
                });
            }
            Err(TryRecvError::Disconnected) => {
                self.in_flight = false;
                self.rx = None;
                self.status = "Worker disconnected".to_owned();
                self.last = Some(LastOutcome::Blocked(
                    "Background worker disconnected unexpectedly.".to_owned(),
                ));
            }
            Err(TryRecvError::Empty) => {}
        }
    }
}

fn run_question_request(
    config: EndpointConfig,
    request: QueryRequest,
) -> Result<QueryResult, String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("runtime init failed: {err}"))?;
    runtime.block_on(async move {
        QaClient::new(config)
            .answer(request.question, request.context)
            .await
            .map_err(|err| err.to_string())
    })
}

fn main() -> eframe::Result<()> {
    let config = EndpointConfig::from_secrets_file(SECRETS_FILE)
        .unwrap_or_else(|_| EndpointConfig::from_env());
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "AI Q&A Chatbot",
        options,
        Box::new(|_cc| Box::new(QaGuiApp::new(config))),
    )
}
