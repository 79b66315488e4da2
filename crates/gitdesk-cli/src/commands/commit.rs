//! `gitdesk commit` command - record staged changes.

use anyhow::{Context, Result};
use gitdesk_git::{CommitRecord, ErrorKind, Facade, Identity};
use inquire::Text;

use super::{CommitArgs, Globals};
use crate::output;

/// Run the commit command.
pub fn run(globals: &Globals, args: &CommitArgs) -> Result<()> {
    let mut facade = globals.open()?;
    let author = explicit_author(args);

    let record = match record(&mut facade, args, author.as_ref()) {
        Err(e) if e.kind() == ErrorKind::MissingIdentity && console::user_attended() => {
            output::warn("No author identity is configured");
            let identity = prompt_identity(author.as_ref())?;
            record(&mut facade, args, Some(&identity))?
        }
        result => result?,
    };

    let verb = if args.amend { "Amended" } else { "Committed" };
    output::success(&format!("{verb} {}", output::commit_line(&record)));
    output::detail(&format!(
        "    {} file(s) changed, {} insertion(s), {} deletion(s)",
        record.files_changed, record.insertions, record.deletions
    ));
    Ok(())
}

fn record(
    facade: &mut Facade,
    args: &CommitArgs,
    author: Option<&Identity>,
) -> gitdesk_git::Result<CommitRecord> {
    if args.amend {
        facade.amend(&args.message, author)
    } else {
        facade.commit(&args.message, author)
    }
}

/// Identity from `--author-name`/`--author-email`; a missing half is
/// completed from configuration.
fn explicit_author(args: &CommitArgs) -> Option<Identity> {
    if args.author_name.is_none() && args.author_email.is_none() {
        return None;
    }
    Some(Identity::new(
        args.author_name.clone().unwrap_or_default(),
        args.author_email.clone().unwrap_or_default(),
    ))
}

fn prompt_identity(partial: Option<&Identity>) -> Result<Identity> {
    let name_default = partial.map(|p| p.name.as_str()).unwrap_or_default();
    let email_default = partial.map(|p| p.email.as_str()).unwrap_or_default();

    let name = Text::new("Author name:")
        .with_initial_value(name_default)
        .prompt()
        .context("Identity prompt cancelled")?;
    let email = Text::new("Author email:")
        .with_initial_value(email_default)
        .prompt()
        .context("Identity prompt cancelled")?;
    Ok(Identity::new(name, email))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(name: Option<&str>, email: Option<&str>) -> CommitArgs {
        CommitArgs {
            message: "msg".into(),
            author_name: name.map(Into::into),
            author_email: email.map(Into::into),
            amend: false,
        }
    }

    #[test]
    fn test_explicit_author() {
        assert!(explicit_author(&args(None, None)).is_none());
        assert_eq!(
            explicit_author(&args(Some("Ada"), None)),
            Some(Identity::new("Ada", ""))
        );
        assert_eq!(
            explicit_author(&args(Some("Ada"), Some("ada@example.com"))),
            Some(Identity::new("Ada", "ada@example.com"))
        );
    }
}
