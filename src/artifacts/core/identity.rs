use anyhow::Context;

/// Author or committer identity stamped onto new commits
///
/// Resolved once by the caller and handed to commit creation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Identity {
    name: String,
    email: String,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl Identity {
    /// Create a new identity stamped with the current time
    pub fn new(name: String, email: String) -> Self {
        Identity {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    pub fn new_with_timestamp(
        name: String,
        email: String,
        timestamp: chrono::DateTime<chrono::FixedOffset>,
    ) -> Self {
        Identity {
            name,
            email,
            timestamp,
        }
    }

    /// Load the identity from `GIT_AUTHOR_NAME`, `GIT_AUTHOR_EMAIL` and, optionally,
    /// `GIT_AUTHOR_DATE` (RFC 2822 or `%Y-%m-%d %H:%M:%S %z`)
    pub fn load_from_env() -> anyhow::Result<Self> {
        let name = std::env::var("GIT_AUTHOR_NAME").context("GIT_AUTHOR_NAME not set")?;
        let email = std::env::var("GIT_AUTHOR_EMAIL").context("GIT_AUTHOR_EMAIL not set")?;
        let timestamp = std::env::var("GIT_AUTHOR_DATE")
            .ok()
            .map(|date| Self::parse_date(&date))
            .transpose()?;

        match timestamp {
            Some(timestamp) => Ok(Identity::new_with_timestamp(name, email, timestamp)),
            None => Ok(Identity::new(name, email)),
        }
    }

    fn parse_date(date: &str) -> anyhow::Result<chrono::DateTime<chrono::FixedOffset>> {
        chrono::DateTime::parse_from_rfc2822(date)
            .or_else(|_| chrono::DateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S %z"))
            .with_context(|| format!("GIT_AUTHOR_DATE is not a valid date: {date}"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Header value in the form `Name <email> <unix-seconds> <+hhmm>`
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }
}
