//! The imfile/omprog drop-in: a RainerScript block that tails a log file and
//! pipes matching messages to a program.
//!
//! The block is written to a tool-owned drop-in under `/etc/rsyslog.d/`,
//! wrapped in a unique marker pair so it can be located and removed without
//! re-rendering.

use std::path::Path;

use crate::engine::{Fragment, FragmentMatcher, Installer, ReloadPlan, Target};
use crate::error::{EngineError, ValidationError};
use crate::exec::Executor;

use super::{SERVICE_UNIT, escape_value};

/// Drop-in file this mechanism owns.
pub const DEFAULT_DROP_IN_PATH: &str = "/etc/rsyslog.d/99-persist.conf";

/// Start marker delimiting the rendered block.
pub const START_MARKER: &str = "# BEGIN persist rsyslog-omprog";
/// End marker delimiting the rendered block.
pub const END_MARKER: &str = "# END persist rsyslog-omprog";

/// Parameters for rendering the imfile/omprog drop-in.
#[derive(Debug, Clone)]
pub struct DropInParams {
    /// Log file to monitor via imfile.
    pub input_file: String,
    /// Tag assigned to messages from the input file.
    pub tag: String,
    /// Syslog severity for the input; empty to omit.
    pub severity: String,
    /// Syslog facility for the input; empty to omit.
    pub facility: String,
    /// Whether to set `addMetadata="on"` on the input.
    pub add_metadata: bool,
    /// imfile polling interval in seconds; 0 to omit.
    pub polling_interval: u32,
    /// Custom imfile state file name; empty to omit.
    pub state_file: String,
    /// Ruleset wrapper name. When set, the input binds to the ruleset and the
    /// condition/action nest inside it; when `None` they appear at top level.
    pub ruleset: Option<String>,
    /// Include a `$syslogtag contains TAG` predicate in the condition.
    pub filter_by_tag: bool,
    /// Trigger when `$msg` contains this substring; empty to omit.
    pub filter_contains: String,
    /// Trigger when `$msg` matches this regex; empty to omit.
    pub filter_regex: String,
    /// Program executed via omprog.
    pub program_path: String,
    /// Optional arguments for the program.
    pub program_args: String,
}

impl DropInParams {
    /// Check required fields and reject values that would break out of the
    /// generated RainerScript.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for missing fields, a missing ruleset
    /// name, an absent filter, or embedded newlines.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.input_file.trim().is_empty() {
            return Err(ValidationError::Required { field: "input file" });
        }
        if self.program_path.trim().is_empty() {
            return Err(ValidationError::Required { field: "payload" });
        }
        if self.tag.trim().is_empty() {
            return Err(ValidationError::Required { field: "tag" });
        }
        if let Some(name) = &self.ruleset
            && name.trim().is_empty()
        {
            return Err(ValidationError::MissingRulesetName);
        }
        if self.filter_contains.is_empty() && self.filter_regex.is_empty() {
            return Err(ValidationError::NoFilter);
        }
        for (field, value) in [
            ("input file", &self.input_file),
            ("tag", &self.tag),
            ("severity", &self.severity),
            ("facility", &self.facility),
            ("state file", &self.state_file),
            ("filter substring", &self.filter_contains),
            ("filter regex", &self.filter_regex),
            ("payload", &self.program_path),
            ("payload arguments", &self.program_args),
        ] {
            if value.contains('\n') {
                return Err(ValidationError::EmbeddedNewline { field });
            }
        }
        if let Some(name) = &self.ruleset
            && name.contains('\n')
        {
            return Err(ValidationError::EmbeddedNewline { field: "ruleset" });
        }
        Ok(())
    }
}

/// Render the drop-in block.
///
/// # Errors
///
/// Returns a [`ValidationError`] when the parameters are invalid; no I/O is
/// performed.
pub fn render(params: &DropInParams) -> Result<Fragment, ValidationError> {
    params.validate()?;

    let mut body = String::new();
    body.push_str(START_MARKER);
    body.push('\n');

    if params.polling_interval > 0 {
        body.push_str(&format!(
            "module(load=\"imfile\" PollingInterval=\"{}\")\n",
            params.polling_interval
        ));
    } else {
        body.push_str("module(load=\"imfile\")\n");
    }
    body.push_str("module(load=\"omprog\")\n\n");

    body.push_str("input(\n");
    body.push_str("\ttype=\"imfile\"\n");
    body.push_str(&format!("\tFile=\"{}\"\n", params.input_file));
    body.push_str(&format!("\tTag=\"{}\"\n", params.tag));
    if !params.severity.is_empty() {
        body.push_str(&format!("\tSeverity=\"{}\"\n", params.severity));
    }
    if !params.facility.is_empty() {
        body.push_str(&format!("\tFacility=\"{}\"\n", params.facility));
    }
    if params.add_metadata {
        body.push_str("\taddMetadata=\"on\"\n");
    }
    // reopenOnTruncate keeps tailing rotated logs so triggers remain armed.
    body.push_str("\treopenOnTruncate=\"on\"\n");
    if !params.state_file.is_empty() {
        body.push_str(&format!("\tStateFile=\"{}\"\n", params.state_file));
    }
    if let Some(name) = &params.ruleset {
        body.push_str(&format!("\truleset=\"{name}\"\n"));
    }
    body.push_str(")\n\n");

    let condition = render_condition(params);
    let action = render_action(params);
    if let Some(name) = &params.ruleset {
        body.push_str(&format!("ruleset(name=\"{name}\") {{\n"));
        body.push_str(&format!("    if {condition} then {{\n"));
        body.push_str(&format!("        {action}\n"));
        body.push_str("    }\n");
        body.push_str("}\n");
    } else {
        body.push_str(&format!("if {condition} then {{\n"));
        body.push_str(&format!("        {action}\n"));
        body.push_str("}\n");
    }

    body.push_str(END_MARKER);
    body.push('\n');

    Ok(Fragment::block(body, START_MARKER, END_MARKER))
}

/// Predicates join in a fixed order: tag-match AND substring-match, then OR'd
/// with the regex match.
fn render_condition(params: &DropInParams) -> String {
    let mut condition = String::new();
    if params.filter_by_tag {
        condition.push_str(&format!(
            "($syslogtag contains '{}')",
            escape_value(&params.tag)
        ));
    }
    if !params.filter_contains.is_empty() {
        if !condition.is_empty() {
            condition.push_str(" and ");
        }
        condition.push_str(&format!(
            "($msg contains '{}')",
            escape_value(&params.filter_contains)
        ));
    }
    if !params.filter_regex.is_empty() {
        if !condition.is_empty() {
            condition.push_str(" or ");
        }
        condition.push_str(&format!(
            "re_match($msg, \"{}\")",
            escape_value(&params.filter_regex)
        ));
    }
    condition
}

fn render_action(params: &DropInParams) -> String {
    if params.program_args.is_empty() {
        format!(
            "action(type=\"omprog\" binary=\"{}\")",
            escape_value(&params.program_path)
        )
    } else {
        format!(
            "action(type=\"omprog\" binary=\"{} {}\")",
            escape_value(&params.program_path),
            escape_value(&params.program_args)
        )
    }
}

/// Matcher for a previously installed drop-in block.
#[must_use]
pub fn matcher() -> FragmentMatcher {
    FragmentMatcher::block(START_MARKER, END_MARKER)
}

/// Write the drop-in and reload rsyslog. The drop-in directory is created on
/// demand; a missing drop-in file reads as empty.
///
/// # Errors
///
/// Propagates validation, idempotency, privilege, I/O and reload errors from
/// the engine.
pub fn install(
    exec: &dyn Executor,
    params: &DropInParams,
    dropin_path: &Path,
    reload: bool,
) -> Result<(), EngineError> {
    let fragment = render(params)?;
    let plan = reload.then(|| ReloadPlan::Unit(SERVICE_UNIT.to_string()));
    Installer::new(exec).install(&Target::drop_in(dropin_path), &fragment, plan.as_ref())
}

/// Remove the drop-in block (deleting the file once empty) and reload
/// rsyslog.
///
/// # Errors
///
/// Propagates idempotency, privilege, I/O and reload errors from the engine.
pub fn remove(exec: &dyn Executor, dropin_path: &Path, reload: bool) -> Result<(), EngineError> {
    let plan = reload.then(|| ReloadPlan::Unit(SERVICE_UNIT.to_string()));
    Installer::new(exec).remove(&Target::drop_in(dropin_path), &matcher(), plan.as_ref())
}
