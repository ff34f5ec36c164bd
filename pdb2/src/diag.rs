//! Diagnostics (findings and errors)

use tracing::trace;

/// Collects the diagnostics reported while decoding a PDB file.
///
/// Diagnostics are split into two channels. The informational channel describes what the
/// decoder recognized, such as the release of VisualC++ that wrote a stream. The error
/// channel describes contents that failed validation. Decoding keeps going after an error
/// whenever it can, so one pass can report everything it finds.
pub struct Diags {
    /// Number of diagnostics in `diags` that are errors.
    pub num_errors: u32,
    /// Every diagnostic, in the order it was reported.
    pub diags: Vec<Diag>,
}

impl Default for Diags {
    fn default() -> Self {
        Self::new()
    }
}

impl Diags {
    /// Starts a new, empty set of diagnostics.
    pub fn new() -> Self {
        Diags {
            num_errors: 0,
            diags: Vec::new(),
        }
    }

    /// True if at least one error has been reported.
    pub fn has_errors(&self) -> bool {
        self.num_errors != 0
    }

    /// Reports a finding on the informational channel.
    pub fn info<S: Into<String>>(&mut self, msg: S) -> &mut Diag {
        let msg: String = msg.into();
        trace!("info : {}", msg);
        self.diags.push(Diag {
            message: msg,
            is_error: false,
            stream: None,
        });
        self.diags.last_mut().unwrap()
    }

    /// Reports a finding on the error channel.
    pub fn error<S: Into<String>>(&mut self, msg: S) -> &mut Diag {
        self.num_errors += 1;
        let msg: String = msg.into();
        trace!("error : {}", msg);
        self.diags.push(Diag {
            message: msg,
            is_error: true,
            stream: None,
        });
        self.diags.last_mut().unwrap()
    }
}

/// A single diagnostic.
pub struct Diag {
    /// Describes the finding.
    pub message: String,
    /// True for the error channel, false for the informational channel.
    pub is_error: bool,
    /// The stream the finding refers to, if known.
    pub stream: Option<u32>,
}

impl Diag {
    /// Records which stream the finding refers to.
    pub fn stream(&mut self, stream: u32) -> &mut Self {
        trace!("    at stream # {}", stream);
        self.stream = Some(stream);
        self
    }
}

impl std::fmt::Display for Diags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for diag in self.diags.iter() {
            write!(f, "{}", diag)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Diag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_error {
            write!(f, "error: ")?;
        }
        writeln!(f, "{}", self.message)?;

        if let Some(stream) = self.stream {
            writeln!(f, "  stream: {stream}")?;
        }

        Ok(())
    }
}
