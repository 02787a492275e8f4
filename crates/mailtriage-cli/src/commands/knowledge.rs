//! `mailtriage knowledge` — query the mock knowledge base.

use mailtriage_core::{KnowledgeBase, StaticKnowledgeBase};

pub fn search(query: &str) -> Result<(), String> {
    let kb = StaticKnowledgeBase::new();
    let results = kb.search(query);

    println!("Found {} record(s) for '{}'", results.len(), query);
    for record in results {
        println!();
        println!("## {}", record.title);
        println!("{}", record.content);
    }
    Ok(())
}
