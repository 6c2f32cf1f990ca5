pub mod address;
pub mod author;
pub mod book;
pub mod book_authors;
pub mod book_stock;
pub mod department;
pub mod employee;
pub mod publisher;

pub use book::Book;
