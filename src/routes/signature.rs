//! Per-handler parameter declarations and the argument spec derived from them.

use crate::error::RouteError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// Receives the request context.
    Request,
    Positional,
    VarPositional,
    KeywordOnly { required: bool },
    VarKeyword,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
}

/// Ordered parameter list of one handler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Signature {
    params: Vec<Param>,
}

/// What the dispatcher needs to know about a handler, computed once at registration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArgSpec {
    pub has_request_arg: bool,
    pub has_var_kw_arg: bool,
    /// Keyword-only names in declaration order.
    pub named_kw_args: Vec<String>,
    pub required_kw_args: Vec<String>,
}

impl ArgSpec {
    pub fn has_named_kw_args(&self) -> bool {
        !self.named_kw_args.is_empty()
    }

    /// Whether the dispatcher should read the query string or body at all.
    pub fn reads_input(&self) -> bool {
        self.has_var_kw_arg || self.has_named_kw_args()
    }
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: &str, kind: ParamKind) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            kind,
        });
        self
    }

    pub fn request(self) -> Self {
        self.param("request", ParamKind::Request)
    }

    pub fn positional(self, name: &str) -> Self {
        self.param(name, ParamKind::Positional)
    }

    pub fn var_positional(self, name: &str) -> Self {
        self.param(name, ParamKind::VarPositional)
    }

    /// Required keyword-only parameter.
    pub fn keyword(self, name: &str) -> Self {
        self.param(name, ParamKind::KeywordOnly { required: true })
    }

    /// Keyword-only parameter with a handler-side default.
    pub fn keyword_default(self, name: &str) -> Self {
        self.param(name, ParamKind::KeywordOnly { required: false })
    }

    pub fn var_keyword(self, name: &str) -> Self {
        self.param(name, ParamKind::VarKeyword)
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }

    /// Classify the parameters. Only variadic or keyword-only parameters may follow the
    /// request parameter; `path` is used for the error message.
    pub fn inspect(&self, path: &str) -> Result<ArgSpec, RouteError> {
        let mut spec = ArgSpec::default();
        for p in &self.params {
            if spec.has_request_arg
                && !matches!(
                    p.kind,
                    ParamKind::VarPositional | ParamKind::KeywordOnly { .. } | ParamKind::VarKeyword
                )
            {
                return Err(RouteError::RequestParamNotLast {
                    path: path.to_string(),
                    param: p.name.clone(),
                });
            }
            match p.kind {
                ParamKind::Request => spec.has_request_arg = true,
                ParamKind::KeywordOnly { required } => {
                    spec.named_kw_args.push(p.name.clone());
                    if required {
                        spec.required_kw_args.push(p.name.clone());
                    }
                }
                ParamKind::VarKeyword => spec.has_var_kw_arg = true,
                ParamKind::Positional | ParamKind::VarPositional => {}
            }
        }
        Ok(spec)
    }
}
