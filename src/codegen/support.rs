//! Module-level constructs shared by every generated method: preamble,
//! enumerations, the exception type, the error check, and the wrapper
//! class lifecycle.

use ctwrap_model::EnumDecl;

use super::builder::{CodeBuilder, Emit};

/// Interpreter version as `(major, minor)`.
pub type PythonVersion = (u32, u32);

/// Value of the session handle while no native session is open.
pub const HANDLE_SENTINEL: i32 = -1;

/// Module header: encoding line, optional license, imports and helpers.
#[derive(Debug, Clone, Copy)]
pub struct Preamble<'a> {
    pub license: Option<&'a str>,
}

impl Emit for Preamble<'_> {
    fn emit(&self, out: &mut CodeBuilder) {
        out.line("# -*- coding: utf-8 -*-");
        if let Some(license) = self.license.filter(|text| !text.trim().is_empty()) {
            out.verbatim(license);
        }
        out.line("import sys, ctypes");
        out.blank();
        out.line("def _to_native_text(value):").nested(|body| {
            body.line("if value is None or isinstance(value, bytes):")
                .nested(|inner| {
                    inner.line("return value");
                })
                .line("return str(value).encode(\"utf-8\")");
        });
        out.blank();
        out.line("def _from_native_text(value):").nested(|body| {
            body.line("if value is None:")
                .nested(|inner| {
                    inner.line("return None");
                })
                .line("return value.decode(\"utf-8\")");
        });
        out.blank();
        out.line("class _HandleState(object):").nested(|body| {
            body.line("UNINITIALIZED = 0").line("OPEN = 1").line("CLOSED = 2");
        });
    }
}

/// An enumeration rendered as a class of integer constants plus a reverse
/// lookup table.
#[derive(Debug, Clone, Copy)]
pub struct EnumBlock<'a>(pub &'a EnumDecl);

impl Emit for EnumBlock<'_> {
    fn emit(&self, out: &mut CodeBuilder) {
        let decl = self.0;
        out.line(format!("class {}(object):", decl.name));
        out.nested(|body| {
            for (code, member) in decl.codes() {
                body.line(format!("{member} = {code}"));
            }
            if decl.members.is_empty() {
                body.line("_names = {}");
                return;
            }
            body.line("_names = {");
            body.nested(|table| {
                for (code, member) in decl.codes() {
                    table.line(format!("{code}: '{member}',"));
                }
            });
            body.line("}");
        });
    }
}

/// `<Class>Exception`, raised by emitted code whenever a status code is not
/// the success value.
#[derive(Debug, Clone, Copy)]
pub struct ExceptionBlock<'a> {
    pub class_name: &'a str,
    pub status_enum: Option<&'a EnumDecl>,
}

impl Emit for ExceptionBlock<'_> {
    fn emit(&self, out: &mut CodeBuilder) {
        out.line(format!("class {}Exception(Exception):", self.class_name));
        out.nested(|body| {
            body.line(
                "''' Carries the status code returned by the library and the arguments of the failed call. '''",
            );
            body.line("def __init__(self, code, *args, **kwargs):");
            body.nested(|init| {
                init.line("Exception.__init__(self)");
                init.line("self.code = code");
                init.line("if \"error\" in kwargs:");
                init.nested(|branch| {
                    branch.line("self.error = str(kwargs[\"error\"])");
                });
                if let Some(status) = self.status_enum {
                    init.line(format!("elif code in {}._names:", status.name));
                    init.nested(|branch| {
                        branch.line(format!("self.error = {}._names[code]", status.name));
                    });
                }
                init.line("else:");
                init.nested(|branch| {
                    branch.line("self.error = \"UNDEFINED\"");
                });
                init.line("self.args = tuple(args)");
                init.line("self.kwargs = dict(kwargs)");
            });
            body.blank();
            body.line("def __str__(self):");
            body.nested(|method| {
                method.line(
                    "return self.error + \" (\" + str(self.code) + \") \" + str(list(self.args)) + \" \" + str(self.kwargs)",
                );
            });
        });
    }
}

/// `catch_error`, the single place status codes are compared against the
/// success value.
#[derive(Debug, Clone, Copy)]
pub struct ErrorCheckBlock<'a> {
    pub class_name: &'a str,
    pub status_enum: Option<&'a EnumDecl>,
}

impl ErrorCheckBlock<'_> {
    /// The first status member, or literal zero without a status enum.
    pub fn success_value(&self) -> String {
        self.status_enum
            .and_then(|status| {
                status
                    .members
                    .first()
                    .map(|first| format!("{}.{first}", status.name))
            })
            .unwrap_or_else(|| "0".to_string())
    }
}

impl Emit for ErrorCheckBlock<'_> {
    fn emit(&self, out: &mut CodeBuilder) {
        out.line("def catch_error(returncode, *args, **kwargs):");
        out.nested(|body| {
            body.line(format!("if returncode != {}:", self.success_value()));
            body.nested(|raise| {
                raise.line(format!(
                    "raise {}Exception(returncode, *args, **kwargs)",
                    self.class_name
                ));
            });
        });
    }
}

/// Opening line of the wrapper class.
#[derive(Debug, Clone, Copy)]
pub struct ClassHeader<'a> {
    pub class_name: &'a str,
}

impl Emit for ClassHeader<'_> {
    fn emit(&self, out: &mut CodeBuilder) {
        out.line(format!("class {}(object):", self.class_name));
    }
}

/// `__init__`: sentinel handle, interpreter check and platform-specific
/// library load. The state only becomes `OPEN` once the library is loaded.
#[derive(Debug, Clone, Copy)]
pub struct Constructor<'a> {
    pub class_name: &'a str,
    pub library_name: &'a str,
    pub handle_name: &'a str,
    pub min_version: PythonVersion,
    pub max_version: PythonVersion,
}

impl Emit for Constructor<'_> {
    fn emit(&self, out: &mut CodeBuilder) {
        let (min_major, min_minor) = self.min_version;
        let (max_major, max_minor) = self.max_version;
        let library = self.library_name;

        out.line("def __init__(self):");
        out.nested(|body| {
            body.line(format!(
                "self.{} = ctypes.c_int({HANDLE_SENTINEL})",
                self.handle_name
            ));
            body.line("self._state = _HandleState.UNINITIALIZED");
            body.blank();
            body.line(format!(
                "if sys.version_info < ({min_major}, {min_minor}) or sys.version_info >= ({max_major}, {max_minor}):"
            ));
            body.nested(|fail| {
                fail.line(format!(
                    "raise EnvironmentError(\"{} requires python >= {min_major}.{min_minor} and < {max_major}.{max_minor}\")",
                    self.class_name
                ));
            });
            body.blank();
            body.line("if sys.platform == 'win32':");
            body.nested(|load| {
                load.line(format!("self.lib = ctypes.cdll.LoadLibrary(\"{library}\")"));
            });
            body.line("elif sys.platform == 'darwin':");
            body.nested(|load| {
                load.line(format!("self.lib = ctypes.CDLL(\"lib{library}.dylib\")"));
            });
            body.line("else:");
            body.nested(|load| {
                load.line(format!("self.lib = ctypes.CDLL(\"lib{library}.so\")"));
            });
            body.line("self._state = _HandleState.OPEN");
        });
    }
}

/// `__del__`: closes the session at most once, and only when a session was
/// actually opened. The state is flipped before the close call so a failing
/// close cannot be retried by a second run. A handle already reset to the
/// sentinel by an explicit close is left alone.
#[derive(Debug, Clone, Copy)]
pub struct Destructor<'a> {
    pub close_method: &'a str,
    pub handle_name: &'a str,
}

impl Emit for Destructor<'_> {
    fn emit(&self, out: &mut CodeBuilder) {
        out.line("def __del__(self):");
        out.nested(|body| {
            body.line(
                "if getattr(self, \"_state\", _HandleState.UNINITIALIZED) != _HandleState.OPEN:",
            );
            body.nested(|closed| {
                closed.line("return");
            });
            body.line("self._state = _HandleState.CLOSED");
            body.line(format!(
                "if self.{}.value != {HANDLE_SENTINEL}:",
                self.handle_name
            ));
            body.nested(|open| {
                open.line(format!("self.{}()", self.close_method));
            });
        });
    }
}

/// Hand-written methods pasted into the wrapper class.
#[derive(Debug, Clone, Copy)]
pub struct UserFunctions<'a> {
    pub source: &'a str,
}

impl Emit for UserFunctions<'_> {
    fn emit(&self, out: &mut CodeBuilder) {
        out.verbatim(self.source);
    }
}
