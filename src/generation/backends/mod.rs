//! Built-in language backends.

pub mod csharp;
pub mod default;
pub mod go;
pub mod java;
pub mod kotlin;
pub mod naming;
pub mod python;
pub mod typescript;

pub use csharp::CSharpGenerator;
pub use default::DefaultGenerator;
pub use go::GoGenerator;
pub use java::JavaGenerator;
pub use kotlin::KotlinGenerator;
pub use python::PythonGenerator;
pub use typescript::TypeScriptGenerator;
