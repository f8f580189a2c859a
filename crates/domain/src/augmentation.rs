use std::fmt::{Debug, Formatter};

/// TLS client identity presented to the upstream service.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// PEM encoded certificate chain.
    pub certificate_pem: String,
    /// PEM encoded private key.
    pub private_key_pem: String,
}

impl Debug for ClientIdentity {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClientIdentity")
            .finish_non_exhaustive()
    }
}

/// Authentication material composed for exactly one outbound call.
///
/// `Authorization` and the client identity are claimed by the first strategy
/// that sets them. Headers overwrite by name, cookies and query parameters
/// accumulate in order.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct AugmentationSet {
    authorization: Option<String>,
    client_identity: Option<ClientIdentity>,
    headers: Vec<(String, String)>,
    query_parameters: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
}

impl AugmentationSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an `Authorization` value has been claimed.
    #[must_use]
    pub fn has_authorization(&self) -> bool {
        self.authorization.is_some()
    }

    /// Whether a TLS client identity has been claimed.
    #[must_use]
    pub fn has_client_identity(&self) -> bool {
        self.client_identity.is_some()
    }

    /// Claims the `Authorization` value. Returns `false` and leaves the set
    /// untouched when it is already claimed.
    pub fn claim_authorization(&mut self, value: String) -> bool {
        if self.authorization.is_some() {
            return false;
        }

        self.authorization = Some(value);
        true
    }

    /// Claims the TLS client identity. Returns `false` when already claimed.
    pub fn claim_client_identity(&mut self, identity: ClientIdentity) -> bool {
        if self.client_identity.is_some() {
            return false;
        }

        self.client_identity = Some(identity);
        true
    }

    /// Sets a header, replacing an earlier one with the same name.
    /// `Authorization` is routed through [`Self::claim_authorization`].
    pub fn set_header(&mut self, name: String, value: String) -> bool {
        if name.eq_ignore_ascii_case("authorization") {
            return self.claim_authorization(value);
        }

        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name.as_str()));
        self.headers.push((name, value));
        true
    }

    /// Appends a query parameter.
    pub fn add_query_parameter(&mut self, name: String, value: String) {
        self.query_parameters.push((name, value));
    }

    /// Appends a cookie.
    pub fn add_cookie(&mut self, name: String, value: String) {
        self.cookies.push((name, value));
    }

    /// Returns the claimed `Authorization` value.
    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    /// Returns the claimed TLS client identity.
    #[must_use]
    pub fn client_identity(&self) -> Option<&ClientIdentity> {
        self.client_identity.as_ref()
    }

    /// Returns headers other than `Authorization`.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        self.headers.as_slice()
    }

    /// Returns accumulated query parameters in application order.
    #[must_use]
    pub fn query_parameters(&self) -> &[(String, String)] {
        self.query_parameters.as_slice()
    }

    /// Returns accumulated cookies in application order.
    #[must_use]
    pub fn cookies(&self) -> &[(String, String)] {
        self.cookies.as_slice()
    }

    /// Returns the combined `Cookie` header value, if any cookie was added.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

impl Debug for AugmentationSet {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let names = |pairs: &[(String, String)]| {
            pairs
                .iter()
                .map(|(name, _)| name.clone())
                .collect::<Vec<_>>()
        };

        formatter
            .debug_struct("AugmentationSet")
            .field("has_authorization", &self.has_authorization())
            .field("has_client_identity", &self.has_client_identity())
            .field("headers", &names(&self.headers))
            .field("query_parameters", &names(&self.query_parameters))
            .field("cookies", &names(&self.cookies))
            .finish()
    }
}
