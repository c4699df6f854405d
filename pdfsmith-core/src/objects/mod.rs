//! PDF object model
//!
//! Primitive and composite values plus the [`ObjectTable`] arena that owns
//! every indirect object of a document. References are plain [`ObjectId`]
//! pairs, so shared and cyclic structures never nest their referents.

mod array;
mod dictionary;
mod primitive;
mod stream;
mod table;

pub use array::PdfArray;
pub use dictionary::PdfDictionary;
pub use primitive::{ObjectId, PdfName, PdfObject, PdfString, StringFormat};
pub use stream::PdfStream;
pub use table::ObjectTable;
