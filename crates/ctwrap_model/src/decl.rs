use serde::Serialize;

/// An enumeration whose members are numbered by position, starting at 0.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<String>,
}

impl EnumDecl {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Member names paired with their integer codes.
    pub fn codes(&self) -> impl Iterator<Item = (usize, &str)> {
        self.members
            .iter()
            .enumerate()
            .map(|(code, name)| (code, name.as_str()))
    }
}

/// One declared argument of a native function.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArgumentDecl {
    pub name: String,
    /// Element type as spelled by the parser (`int`, `double`, `float`,
    /// `char`, `bool`); anything else is rejected at generation time.
    #[serde(rename = "type")]
    pub type_name: String,
    pub npointer: u32,
    pub is_handle: bool,
    pub is_outarg: bool,
    pub is_array: bool,
    pub is_string: bool,
    pub is_sizearg: bool,
    /// Indices of the sibling arguments whose product is this array's length.
    pub arraysizes: Vec<usize>,
}

impl ArgumentDecl {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            npointer: 0,
            is_handle: false,
            is_outarg: false,
            is_array: false,
            is_string: false,
            is_sizearg: false,
            arraysizes: Vec::new(),
        }
    }

    pub fn pointer(mut self, depth: u32) -> Self {
        self.npointer = depth;
        self
    }

    pub fn handle(mut self) -> Self {
        self.is_handle = true;
        self
    }

    pub fn out(mut self) -> Self {
        self.is_outarg = true;
        self
    }

    /// Marks the argument as a C string (`char*`).
    pub fn string(mut self) -> Self {
        self.is_string = true;
        self.npointer = self.npointer.max(1);
        self
    }

    pub fn array(mut self, sizes: impl IntoIterator<Item = usize>) -> Self {
        self.is_array = true;
        self.arraysizes = sizes.into_iter().collect();
        self.npointer = self.npointer.max(1);
        self
    }

    pub fn sizearg(mut self) -> Self {
        self.is_sizearg = true;
        self
    }
}

/// A native function declaration in emission order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub uses_handle: bool,
    pub returns_error: bool,
    pub arguments: Vec<ArgumentDecl>,
    /// Present only when the function does not follow the status-code
    /// convention.
    pub return_value: Option<ArgumentDecl>,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uses_handle: false,
            returns_error: true,
            arguments: Vec::new(),
            return_value: None,
        }
    }

    /// Appends an argument; a handle argument switches `uses_handle` on.
    pub fn arg(mut self, argument: ArgumentDecl) -> Self {
        if argument.is_handle {
            self.uses_handle = true;
        }
        self.arguments.push(argument);
        self
    }

    /// Switches to the explicit-return convention.
    pub fn returning(mut self, value: ArgumentDecl) -> Self {
        self.returns_error = false;
        self.return_value = Some(value);
        self
    }

    pub fn without_handle(mut self) -> Self {
        self.uses_handle = false;
        self
    }

    /// Position of the session handle, when the function threads one.
    pub fn handle_index(&self) -> Option<usize> {
        if !self.uses_handle {
            return None;
        }
        self.arguments.iter().position(|arg| arg.is_handle)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeclarationModel {
    /// Name of the enumeration holding status codes, if the library has one.
    pub status_enum: Option<String>,
    pub enums: Vec<EnumDecl>,
    pub functions: Vec<FunctionDecl>,
}

impl DeclarationModel {
    pub fn find_enum(&self, name: &str) -> Option<&EnumDecl> {
        self.enums.iter().find(|decl| decl.name == name)
    }

    pub fn find_function(&self, symbol: &str) -> Option<&FunctionDecl> {
        self.functions.iter().find(|decl| decl.name == symbol)
    }

    /// The status-code enumeration, when it is named and declared.
    pub fn status_codes(&self) -> Option<&EnumDecl> {
        self.status_enum
            .as_deref()
            .and_then(|name| self.find_enum(name))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|decl| decl.name.as_str())
    }
}
