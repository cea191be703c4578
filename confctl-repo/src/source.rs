/// One of `{token, (sshKey, sshPassword)}` per repository (§4.5).
#[derive(Debug, Clone)]
pub enum Auth {
    Token(String),
    Ssh { key: String, password: Option<String> },
}

/// A single `owner/name@ref` source, with its own authentication.
#[derive(Debug, Clone)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
    pub reference: String,
    pub auth: Auth,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, reference: impl Into<String>, auth: Auth) -> RepoRef {
        RepoRef {
            owner: owner.into(),
            name: name.into(),
            reference: reference.into(),
            auth,
        }
    }

    /// The assembler picks SSH transport when an SSH key is present, else
    /// HTTPS with the token as a basic-auth password (§4.5).
    pub fn clone_url(&self, host: &str) -> String {
        match &self.auth {
            Auth::Ssh { .. } => format!("git@{}:{}/{}.git", host, self.owner, self.name),
            Auth::Token(token) => format!("https://x-access-token:{}@{}/{}/{}.git", token, host, self.owner, self.name),
        }
    }
}

/// Either a monolithic single source, or a customer/shared split (§4.5).
#[derive(Debug, Clone)]
pub enum Layout {
    Monolithic(RepoRef),
    Split { customer: RepoRef, shared: RepoRef },
}

/// Cache key: `(owner, name, ref[, sharedName, sharedRef])` (§4.5).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    owner: String,
    name: String,
    reference: String,
    shared_name: Option<String>,
    shared_ref: Option<String>,
}

impl Layout {
    pub fn cache_key(&self) -> CacheKey {
        match self {
            Layout::Monolithic(r) => CacheKey {
                owner: r.owner.clone(),
                name: r.name.clone(),
                reference: r.reference.clone(),
                shared_name: None,
                shared_ref: None,
            },
            Layout::Split { customer, shared } => CacheKey {
                owner: customer.owner.clone(),
                name: customer.name.clone(),
                reference: customer.reference.clone(),
                shared_name: Some(shared.name.clone()),
                shared_ref: Some(shared.reference.clone()),
            },
        }
    }
}
