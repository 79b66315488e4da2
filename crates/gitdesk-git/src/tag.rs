//! Tags.

use crate::branch_name::validate_tag_name;
use crate::error::{Error, Result};
use crate::facade::{head_commit, Facade};
use crate::types::TagRef;

impl Facade {
    /// All tags, sorted by name.
    ///
    /// # Errors
    /// Returns error if unbound or a tag cannot be read.
    pub fn list_tags(&self) -> Result<Vec<TagRef>> {
        let repo = self.repo()?;
        let mut names: Vec<String> = repo
            .tag_names(None)?
            .iter()
            .flatten()
            .map(String::from)
            .collect();
        names.sort();

        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            let reference = repo.find_reference(&format!("refs/tags/{name}"))?;
            let message = reference
                .peel_to_tag()
                .ok()
                .and_then(|tag| tag.message().map(|m| m.trim().to_string()));
            let target = reference.peel_to_commit()?.id().to_string();
            tags.push(TagRef {
                name,
                target,
                message,
            });
        }
        Ok(tags)
    }

    /// Tag `target` (a revision, default HEAD).
    ///
    /// With a non-blank `message` the tag is annotated and needs an identity;
    /// otherwise it is lightweight.
    ///
    /// # Errors
    /// - [`Error::InvalidTagName`] if `name` fails validation
    /// - [`Error::TagExists`] if the tag exists
    /// - [`Error::RevisionNotFound`] if `target` does not name a commit
    /// - [`Error::NoCommits`] if `target` is omitted before the first commit
    pub fn create_tag(
        &mut self,
        name: &str,
        message: Option<&str>,
        target: Option<&str>,
    ) -> Result<TagRef> {
        validate_tag_name(name)?;
        let repo = self.repo()?;
        if repo.find_reference(&format!("refs/tags/{name}")).is_ok() {
            return Err(Error::TagExists(name.to_string()));
        }

        let commit = match target {
            Some(rev) => repo
                .revparse_single(rev)
                .and_then(|object| object.peel_to_commit())
                .map_err(|_| Error::RevisionNotFound(rev.to_string()))?,
            None => head_commit(repo)?.ok_or(Error::NoCommits)?,
        };

        let message = message.map(str::trim).filter(|m| !m.is_empty());
        match message {
            Some(text) => {
                let tagger = self.resolve_identity(None)?.signature()?;
                repo.tag(name, commit.as_object(), &tagger, text, false)?;
            }
            None => {
                repo.tag_lightweight(name, commit.as_object(), false)?;
            }
        }

        tracing::info!(tag = name, target = %commit.id(), annotated = message.is_some(), "created tag");
        self.notify();
        Ok(TagRef {
            name: name.to_string(),
            target: commit.id().to_string(),
            message: message.map(String::from),
        })
    }

    /// Delete a local tag.
    ///
    /// # Errors
    /// Returns [`Error::TagNotFound`] if it does not exist.
    pub fn delete_tag(&mut self, name: &str) -> Result<()> {
        let repo = self.repo()?;
        if repo.find_reference(&format!("refs/tags/{name}")).is_err() {
            return Err(Error::TagNotFound(name.to_string()));
        }

        repo.tag_delete(name)?;
        tracing::info!(tag = name, "deleted tag");
        self.notify();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::ErrorKind;
    use crate::test_support::{init_repo, init_repo_with_commit, write};

    #[test]
    fn test_lightweight_and_annotated() {
        let (temp, mut facade) = init_repo_with_commit();
        let first = facade.recent_commits(1).unwrap()[0].hash.clone();
        write(temp.path(), "b.txt", "b");
        facade.stage(&["b.txt"]).unwrap();
        facade.commit("second", None).unwrap();

        facade.create_tag("v2", None, None).unwrap();
        let v1 = facade
            .create_tag("v1", Some("  First release  "), Some(&first[..8]))
            .unwrap();
        assert_eq!(v1.target, first);

        let tags = facade.list_tags().unwrap();
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["v1", "v2"]);
        assert_eq!(tags[0].message.as_deref(), Some("First release"));
        assert_eq!(tags[0].target, first);
        assert_eq!(tags[1].message, None);
    }

    #[test]
    fn test_blank_message_makes_lightweight_tag() {
        let (_temp, mut facade) = init_repo_with_commit();
        let tag = facade.create_tag("light", Some("   "), None).unwrap();
        assert_eq!(tag.message, None);
        assert_eq!(facade.list_tags().unwrap()[0].message, None);
    }

    #[test]
    fn test_tag_errors() {
        let (_temp, mut facade) = init_repo_with_commit();
        facade.create_tag("v1", None, None).unwrap();

        let cases = [
            (facade.create_tag("v1", None, None), ErrorKind::TagExists),
            (facade.create_tag("bad tag", None, None), ErrorKind::InvalidTagName),
            (facade.create_tag("v9", None, Some("nonexistent-rev")), ErrorKind::RevisionNotFound),
        ];
        for (result, expected) in cases {
            assert_eq!(result.unwrap_err().kind(), expected);
        }

        facade.delete_tag("v1").unwrap();
        assert!(facade.list_tags().unwrap().is_empty());
        assert_eq!(facade.delete_tag("v1").unwrap_err().kind(), ErrorKind::TagNotFound);
    }

    #[test]
    fn test_tag_without_commits() {
        let (_temp, mut facade) = init_repo();
        let err = facade.create_tag("v0", None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoCommits);
    }
}
