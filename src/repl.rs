use std::borrow::Cow;

use miette::{IntoDiagnostic, Result};

use clap_repl::reedline::{
    Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, Reedline, Signal,
};
use tracing::debug;

use crate::session::{Flow, Session};

static DEFAULT_PROMPT_INDICATOR: &str = "$ ";
static DEFAULT_MULTILINE_INDICATOR: &str = "::: ";

/// Prompt showing the bucket the session is in, e.g. `/users $ `.
pub struct BucketPrompt {
    path: String,
}

impl BucketPrompt {
    pub fn new(path: String) -> Self {
        Self { path }
    }
}

impl Prompt for BucketPrompt {
    fn render_prompt_left(&self) -> Cow<str> {
        Cow::Owned(format!("{} ", self.path))
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _prompt_mode: PromptEditMode) -> Cow<str> {
        DEFAULT_PROMPT_INDICATOR.into()
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        Cow::Borrowed(DEFAULT_MULTILINE_INDICATOR)
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse-search: {}) ",
            prefix, history_search.term
        ))
    }
}

/// Drive `session` from an interactive line editor until `exit` or Ctrl-D.
///
/// Ctrl-C abandons the line being edited and keeps the session going.
pub fn run(session: &mut Session<'_>) -> Result<()> {
    let mut editor = Reedline::create();
    let stdout = std::io::stdout();

    loop {
        let prompt = BucketPrompt::new(session.level().display_path());
        match editor.read_line(&prompt).into_diagnostic()? {
            Signal::Success(line) => {
                let flow = session
                    .execute(&line, &mut stdout.lock())
                    .into_diagnostic()?;
                if flow == Flow::Exit {
                    break;
                }
            }
            Signal::CtrlC => continue,
            _ => {
                debug!("end of input");
                break;
            }
        }
    }

    Ok(())
}
