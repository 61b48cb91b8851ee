//! Basic LTSV reading with a class map.
//!
//! Run with: cargo run --example simple

use ltsv_helper::{ClassMapBuilder, LtsvReader, Mappable};
use std::error::Error;

#[derive(Debug, Default, PartialEq)]
struct User {
    id: u32,
    name: String,
    email: String,
}

impl Mappable for User {
    fn configure(map: &mut ClassMapBuilder<Self>) {
        map.default_constructor();
        map.property("id", |u: &mut User, v: u32| u.id = v);
        map.property("name", |u: &mut User, v: String| u.name = v);
        map.property("email", |u: &mut User, v: String| u.email = v);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let input = "id:42\tname:Alice Johnson\temail:alice@example.com\n\
                 id:43\tname:Bob Smith\n";

    let mut reader = LtsvReader::from_str(input);
    let users = reader.records::<User>().collect::<Result<Vec<_>, _>>()?;
    for user in &users {
        println!("{:?}", user);
    }

    // Bob has no email label, so the field keeps its default
    assert_eq!(users[1].email, "");
    println!("✓ Read {} users", users.len());

    Ok(())
}
