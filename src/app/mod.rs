//! Interactive quiz loop on stdin/stdout
//!
//! The session controller never blocks; this host owns the async side. Each
//! collaborator call runs on its own task and reports back through a channel,
//! tagged so the controller can drop results that arrive too late.

pub mod command;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::Config;
use crate::quiz::{
    CompletionTicket, Delivery, DifficultyTier, GeneratedQuestion, Grading, GradingApplied,
    Passage, QuizError, RequestTag, SectionIndex, SectionPhase, SectionPrompt, SessionController,
    SkillStatistics, Tutor,
};
use command::{Command, HELP, Line, ParseResult, parse_line};

/// Results delivered back to the loop by spawned tasks
#[derive(Debug)]
pub enum AppEvent {
    QuestionReady(RequestTag, Result<GeneratedQuestion, QuizError>),
    Graded(RequestTag, Result<Grading, QuizError>),
    CompletionDue(CompletionTicket),
}

/// Whether the loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The main application
pub struct App {
    config: Config,
    session: SessionController,
    tutor: Arc<dyn Tutor>,
    /// Section shown at the prompt
    current: SectionIndex,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    /// Create an application on the built-in passage
    pub fn new(config: Config, tutor: Arc<dyn Tutor>) -> Result<Self> {
        let session = SessionController::new(Passage::default_passage())?
            .with_prioritizer(config.prioritizer())
            .with_recommender(config.recommender());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self { config, session, tutor, current: 0, events_tx, events_rx })
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn current_section(&self) -> SectionIndex {
        self.current
    }

    /// Run the application main loop until :quit or end of input
    pub async fn run(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        self.show_passage_header();
        self.enter_section(0);
        prompt()?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if self.handle_line(&line).await == Flow::Quit {
                        break;
                    }
                }
                Some(event) = self.events_rx.recv() => self.handle_event(event),
            }
            prompt()?;
        }

        info!(
            correct = self.session.correct_answers(),
            completed = self.session.completed_sections(),
            "session ended"
        );
        Ok(())
    }

    /// Act on one line of input
    pub async fn handle_line(&mut self, line: &str) -> Flow {
        match parse_line(line) {
            Line::Blank => {}
            Line::Answer(text) => self.submit_answer(&text),
            Line::Command(ParseResult::Ok(command)) => return self.execute(command).await,
            Line::Command(ParseResult::UnknownCommand(cmd)) => {
                self.say(&format!("Unknown command :{cmd}. Type :help for a list."));
            }
            Line::Command(ParseResult::MissingArgument(cmd)) => {
                self.say(&format!(":{cmd} needs an argument. Type :help for usage."));
            }
            Line::Command(ParseResult::InvalidArgument { command, argument }) if command == "new" => {
                let tiers: Vec<_> = DifficultyTier::ALL.iter().map(|t| t.id()).collect();
                self.say(&format!("Unknown level {argument}. Choose from {}.", tiers.join(", ")));
            }
            Line::Command(ParseResult::InvalidArgument { command, argument }) => {
                self.say(&format!("Invalid argument for :{command}: {argument}"));
            }
        }
        Flow::Continue
    }

    async fn execute(&mut self, command: Command) -> Flow {
        match command {
            Command::Next => {
                if self.current + 1 < self.session.total_sections() {
                    self.enter_section(self.current + 1);
                } else {
                    self.say("This is the last section.");
                }
            }
            Command::Prev => {
                if self.current > 0 {
                    self.enter_section(self.current - 1);
                } else {
                    self.say("This is the first section.");
                }
            }
            Command::Goto(n) => {
                let total = self.session.total_sections();
                if n <= total {
                    self.enter_section(n - 1);
                } else {
                    self.say(&format!("There are only {total} sections."));
                }
            }
            Command::Retry => match self.session.try_again(self.current) {
                Ok(()) => self.show_section(),
                Err(e) => self.say(&e.user_message()),
            },
            Command::Regenerate => match self.session.retry_generation(self.current) {
                Ok(prompt) => self.follow(prompt),
                Err(e) => self.say(&e.user_message()),
            },
            Command::Passage => {
                let passage = self.session.passage();
                let text = format!("{}\n\n{}", passage.title, passage.full_text());
                self.say(&text);
            }
            Command::Stats => {
                self.say(&render_stats(&self.session, &self.session.skill_statistics()));
            }
            Command::Restart => match self.session.restart() {
                Ok(()) => {
                    self.show_passage_header();
                    self.enter_section(0);
                }
                Err(e) => self.say(&e.to_string()),
            },
            Command::New(tier) => self.new_passage(tier).await,
            Command::Help => self.say(HELP),
            Command::Quit => return Flow::Quit,
            Command::Nop => {}
        }
        Flow::Continue
    }

    /// Apply a result from a spawned task
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::QuestionReady(tag, result) => match self.session.accept_question(tag, result) {
                Ok(Delivery::Applied(())) if tag.section == self.current => self.show_section(),
                Ok(_) => {}
                Err(_) if tag.section == self.current => self.show_section(),
                Err(_) => {}
            },
            AppEvent::Graded(tag, result) => match self.session.accept_grading(tag, result) {
                Ok(Delivery::Applied(GradingApplied { report, completion })) => {
                    if let Some(ticket) = completion {
                        self.schedule_completion(ticket);
                    }
                    if report.section == self.current {
                        self.show_section();
                    }
                }
                Ok(Delivery::Stale) => {}
                Err(_) if tag.section == self.current => self.show_section(),
                Err(_) => {}
            },
            AppEvent::CompletionDue(ticket) => {
                if self.session.complete_session(ticket) {
                    self.say(&render_completion(&self.session, self.config.default_difficulty));
                }
            }
        }
    }

    fn enter_section(&mut self, index: SectionIndex) {
        self.current = index;
        match self.session.prepare_section(index) {
            Ok(prompt) => self.follow(prompt),
            Err(e) => self.say(&e.user_message()),
        }
    }

    /// Show the section, spawning question generation when needed
    fn follow(&mut self, prompt: SectionPrompt) {
        if let SectionPrompt::Generate { tag, request } = prompt {
            let tutor = Arc::clone(&self.tutor);
            let tx = self.events_tx.clone();
            debug!(?tag, "requesting question");
            tokio::spawn(async move {
                let result = tutor.generate_question(request).await;
                let _ = tx.send(AppEvent::QuestionReady(tag, result));
            });
        }
        self.show_section();
    }

    fn submit_answer(&mut self, text: &str) {
        match self.session.submit(self.current, text) {
            Ok(pending) => {
                let tutor = Arc::clone(&self.tutor);
                let tx = self.events_tx.clone();
                debug!(tag = ?pending.tag, "requesting grading");
                tokio::spawn(async move {
                    let result = tutor.evaluate_answer(pending.request).await;
                    let _ = tx.send(AppEvent::Graded(pending.tag, result));
                });
                self.say("Checking your answer...");
            }
            Err(e) => self.say(&e.user_message()),
        }
    }

    fn schedule_completion(&self, ticket: CompletionTicket) {
        let tx = self.events_tx.clone();
        let delay = Duration::from_millis(self.config.completion_delay_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(AppEvent::CompletionDue(ticket));
        });
    }

    async fn new_passage(&mut self, tier: Option<DifficultyTier>) {
        let tier = tier.unwrap_or_else(|| self.session.next_tier_or(self.config.default_difficulty));
        self.say(&format!("Writing a new {} passage...", tier.label()));

        let tutor = Arc::clone(&self.tutor);
        match self.session.request_new_passage(tutor.as_ref(), tier).await {
            Ok(()) => {
                self.show_passage_header();
                self.enter_section(0);
            }
            Err(e) => {
                self.say(&format!("{} Your current passage is unchanged.", e.user_message()));
            }
        }
    }

    fn show_passage_header(&self) {
        let passage = self.session.passage();
        let level = passage.difficulty.map(|d| format!(" ({})", d.label())).unwrap_or_default();
        self.say(&format!(
            "{}{level}\n{} sections. Type :help for commands.",
            passage.title,
            passage.section_count()
        ));
    }

    fn show_section(&self) {
        self.say(&render_section(&self.session, self.current));
    }

    fn say(&self, text: &str) {
        println!("\n{}", wrap(text, self.config.wrap_width));
    }
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}

/// Wrap each line of `text` to `width`, keeping blank lines
pub fn wrap(text: &str, width: usize) -> String {
    text.lines()
        .map(|line| if line.is_empty() { String::new() } else { textwrap::fill(line, width) })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The section's paragraph followed by whatever its phase calls for
pub fn render_section(session: &SessionController, index: SectionIndex) -> String {
    let mut lines = Vec::new();
    let marker = match session.section_correctness(index) {
        Some(true) => " [correct]",
        Some(false) => " [answered]",
        None => "",
    };
    lines.push(format!("Section {} of {}{marker}", index + 1, session.total_sections()));
    lines.push(String::new());
    lines.push(session.passage().section(index).unwrap_or_default().to_string());
    lines.push(String::new());

    let Some(section) = session.section(index) else {
        return lines.join("\n");
    };

    if let Some(question) = section.question() {
        lines.push(format!("{} question: {}", question.skill, question.question));
        lines.push(format!("Hint: {}", question.soft_prompt));
    }

    match section.phase() {
        SectionPhase::AwaitingQuestion => lines.push("Generating a question...".to_string()),
        SectionPhase::Errored => {
            lines.push(section.error().unwrap_or("Unable to generate content.").to_string());
            lines.push("Type :regen to try again.".to_string());
        }
        SectionPhase::Ready => {
            if let Some(error) = section.error() {
                lines.push(format!("Your answer: {}", section.answer()));
                lines.push(format!("{error} Type your answer again to resubmit."));
            }
        }
        SectionPhase::Submitting => lines.push("Checking your answer...".to_string()),
        SectionPhase::Evaluated => {
            lines.push(format!("Your answer: {}", section.answer()));
            if let Some(grading) = section.grading() {
                let verdict = if grading.correct { "Correct!" } else { "Not quite." };
                lines.push(format!("{verdict} {}", grading.explanation));
                if !grading.correct {
                    lines.push("Type :retry to answer again.".to_string());
                } else if index + 1 < session.total_sections() {
                    lines.push("Type :next to continue.".to_string());
                }
            }
        }
    }

    lines.join("\n")
}

/// Score so far and the per-skill first-attempt record
pub fn render_stats(session: &SessionController, stats: &SkillStatistics) -> String {
    let summary = session.summary();
    let mut lines = vec![format!(
        "Score: {} of {} completed sections correct on the first try ({} sections total)",
        summary.correct, summary.completed, summary.total
    )];
    for (skill, tally) in stats.iter() {
        let detail = match tally.ratio() {
            Some(ratio) => format!("{}/{} ({:.0}%)", tally.correct, tally.tested, ratio * 100.0),
            None => "not tested yet".to_string(),
        };
        lines.push(format!("  {:<14}{detail}", skill.name()));
    }
    let focus = session.prioritized_skills();
    if !focus.is_empty() {
        let names: Vec<_> = focus.iter().map(|s| s.name()).collect();
        lines.push(format!("Practicing next: {}", names.join(", ")));
    }
    lines.join("\n")
}

/// Final score with a suggestion for the next passage
pub fn render_completion(
    session: &SessionController,
    default: DifficultyTier,
) -> String {
    let summary = session.summary();
    let next = session.next_tier_or(default);
    format!(
        "Passage complete!\n\nYou scored {} out of {} ({}%). {}\n\n\
         Suggested next level: {}. Type :new to continue, or :new <tier> to choose.",
        summary.correct,
        summary.completed,
        summary.percentage,
        summary.band.message(),
        next.label()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::{
        AnswerGrader, ComprehensionSkill, GradingRequest, PassageGenerator,
        PassageRequest, QuestionGenerator, QuestionRequest,
    };
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    /// Marks answers containing "because" correct
    struct ScriptedTutor;

    #[async_trait]
    impl QuestionGenerator for ScriptedTutor {
        async fn generate_question(
            &self,
            request: QuestionRequest,
        ) -> Result<GeneratedQuestion, QuizError> {
            if request.paragraph.contains("FAIL") {
                return Err(QuizError::Generation("scripted failure".into()));
            }
            Ok(GeneratedQuestion::new("Why?", ComprehensionSkill::Reasoning))
        }
    }

    #[async_trait]
    impl AnswerGrader for ScriptedTutor {
        async fn evaluate_answer(&self, request: GradingRequest) -> Result<Grading, QuizError> {
            let correct = request.answer.contains("because");
            Ok(Grading { correct, explanation: "Scripted.".into() })
        }
    }

    #[async_trait]
    impl PassageGenerator for ScriptedTutor {
        async fn generate_passage(&self, request: PassageRequest) -> Result<Passage, QuizError> {
            Ok(Passage::from_text("Tides", "The moon pulls.\n\nWater rises.")
                .with_difficulty(request.difficulty))
        }
    }

    fn app() -> App {
        let config = Config { completion_delay_ms: 0, ..Config::default() };
        App::new(config, Arc::new(ScriptedTutor)).unwrap()
    }

    async fn pump(app: &mut App) {
        let event = app.events_rx.recv().await.unwrap();
        app.handle_event(event);
    }

    #[tokio::test]
    async fn question_arrives_for_first_section() {
        let mut app = app();
        app.enter_section(0);
        assert_eq!(app.session.section(0).unwrap().phase(), SectionPhase::AwaitingQuestion);

        pump(&mut app).await;
        assert_eq!(app.session.section(0).unwrap().phase(), SectionPhase::Ready);
        assert_eq!(app.session.cached_question(0).unwrap().question, "Why?");
    }

    #[tokio::test]
    async fn answer_is_graded_and_counted() {
        let mut app = app();
        app.enter_section(0);
        pump(&mut app).await;

        app.handle_line("They dance because food is near").await;
        assert_eq!(app.session.section(0).unwrap().phase(), SectionPhase::Submitting);
        pump(&mut app).await;

        assert_eq!(app.session.section(0).unwrap().phase(), SectionPhase::Evaluated);
        assert_eq!(app.session.correct_answers(), 1);
        assert_eq!(app.session.section_correctness(0), Some(true));
    }

    #[tokio::test]
    async fn retry_after_incorrect_answer() {
        let mut app = app();
        app.enter_section(0);
        pump(&mut app).await;

        app.handle_line("no idea").await;
        pump(&mut app).await;
        assert_eq!(app.session.section_correctness(0), Some(false));

        app.handle_line(":retry").await;
        assert_eq!(app.session.section(0).unwrap().phase(), SectionPhase::Ready);
        assert_eq!(app.session.section(0).unwrap().answer(), "");
    }

    #[tokio::test]
    async fn navigation_stays_in_range() {
        let mut app = app();
        app.handle_line(":prev").await;
        assert_eq!(app.current_section(), 0);

        let total = app.session.total_sections();
        app.handle_line(&format!(":goto {total}")).await;
        assert_eq!(app.current_section(), total - 1);
        app.handle_line(":next").await;
        assert_eq!(app.current_section(), total - 1);
        app.handle_line(&format!(":goto {}", total + 1)).await;
        assert_eq!(app.current_section(), total - 1);
    }

    #[tokio::test]
    async fn finishing_every_section_completes_the_passage() {
        let mut app = app();
        let total = app.session.total_sections();
        for index in 0..total {
            app.enter_section(index);
            pump(&mut app).await;
            app.handle_line("because of the waggle dance").await;
            pump(&mut app).await;
        }

        assert!(!app.session.is_complete());
        pump(&mut app).await;
        assert!(app.session.is_complete());
        assert_eq!(app.session.summary().percentage, 100);
    }

    #[tokio::test]
    async fn new_passage_resets_to_first_section() {
        let mut app = app();
        app.handle_line(":goto 3").await;
        app.handle_line(":new beginner").await;

        assert_eq!(app.current_section(), 0);
        assert_eq!(app.session.passage().title, "Tides");
        assert_eq!(app.session.passage().difficulty, Some(DifficultyTier::Beginner));
    }

    #[tokio::test]
    async fn restart_replays_the_same_passage() {
        let mut app = app();
        let title = app.session.passage().title.clone();
        app.enter_section(0);
        pump(&mut app).await;
        app.handle_line("because the scouts dance").await;
        pump(&mut app).await;
        app.handle_line(":goto 2").await;

        app.handle_line(":restart").await;

        assert_eq!(app.current_section(), 0);
        assert_eq!(app.session.passage().title, title);
        assert_eq!(app.session.completed_sections(), 0);
        assert_eq!(app.session.section(0).unwrap().phase(), SectionPhase::AwaitingQuestion);

        // the question requested before the restart belongs to the old run
        pump(&mut app).await;
        assert!(app.session.cached_question(1).is_none());
    }

    #[tokio::test]
    async fn last_section_first_then_the_rest_completes() {
        let mut app = app();
        let total = app.session.total_sections();
        let order = std::iter::once(total - 1).chain(0..total - 1);
        for index in order {
            app.enter_section(index);
            pump(&mut app).await;
            app.handle_line("because of the waggle dance").await;
            pump(&mut app).await;
        }

        pump(&mut app).await;
        assert!(app.session.is_complete());
    }

    #[tokio::test]
    async fn quit_stops_the_loop() {
        let mut app = app();
        assert_eq!(app.handle_line(":q").await, Flow::Quit);
        assert_eq!(app.handle_line("answer").await, Flow::Continue);
    }

    #[test]
    fn stats_list_every_skill() {
        let session = SessionController::new(Passage::default_passage()).unwrap();
        let text = render_stats(&session, &session.skill_statistics());
        assert!(text.starts_with("Score: 0 of 0"));
        assert!(text.contains("Understanding"));
        assert!(text.contains("not tested yet"));
    }

    #[test]
    fn wrap_keeps_paragraph_breaks() {
        assert_eq!(wrap("one two three\n\nfour", 8), "one two\nthree\n\nfour");
    }
}
