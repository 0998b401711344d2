//! Invoicing - compiling entity patches
//!
//! This example builds patches for a small invoicing schema and prints the
//! statements both compiler strategies produce for them, then shows how the
//! scope cache indexes the same entities.
//!
//! Run with: cargo run --example invoicing -p sqlpatch-core

use std::sync::Arc;

use sqlpatch_core::compiler::{BulkCompiler, CompilerOptions, DefaultCompiler, PatchCompiler};
use sqlpatch_core::dialect::{Dialect, PostgresDialect};
use sqlpatch_core::schema::{BelongsTo, Entity, HasMany};
use sqlpatch_core::{MetaSchema, Patch, ScopeCache, Statement};
use sqlpatch_derive::Entity;

// =============================================================================
// SCHEMA DEFINITIONS
// =============================================================================

/// A billed client.
#[derive(Debug, Default, Entity)]
#[entity(table = "clients")]
pub struct Client {
    #[column(primary_key)]
    pub id: i64,
    pub name: String,
    #[column(omit_empty)]
    pub email: Option<String>,
    #[relation(foreign_key = "id:client_id")]
    pub invoices: HasMany<Invoice>,
}

/// An invoice sent to a client.
#[derive(Debug, Default, Entity)]
#[entity(table = "invoices")]
pub struct Invoice {
    #[column(primary_key)]
    pub id: i64,
    pub client_id: i64,
    pub number: String,
    pub total_cents: i64,
    #[column(omit_empty)]
    pub status: String,
    #[relation(foreign_key = "client_id:id")]
    pub client: BelongsTo<Client>,
}

fn print_statements(description: &str, stmts: &[Box<dyn Statement>]) {
    println!("-- {description}");
    for stmt in stmts {
        match stmt.build() {
            Ok((sql, params)) => println!("{sql};  -- {params:?}"),
            Err(e) => println!("-- error: {e}"),
        }
    }
    println!();
}

fn main() {
    let meta = MetaSchema::new();
    meta.register::<Client>();
    meta.register::<Invoice>();
    meta.compute();
    let meta = Arc::new(meta);

    let clients = [
        Client {
            id: 1,
            name: String::from("Acme"),
            email: Some(String::from("billing@acme.test")),
            ..Client::default()
        },
        Client {
            id: 2,
            name: String::from("Globex"),
            ..Client::default()
        },
    ];
    let invoices: Vec<Invoice> = (1..=4)
        .map(|n| Invoice {
            id: n,
            client_id: 1 + n % 2,
            number: format!("INV-{n:04}"),
            total_cents: n * 12_500,
            status: if n == 4 { String::new() } else { String::from("sent") },
            ..Invoice::default()
        })
        .collect();

    let mut patches: Vec<Patch> = vec![];
    patches.extend(clients.iter().map(|c| meta.insert_patch_of(c)));
    patches.extend(invoices.iter().map(|i| meta.insert_patch_of(i)));
    patches.push(meta.update_patch_of(&invoices[0]));
    patches.push(meta.delete_patch_of(&invoices[1]));
    patches.push(meta.delete_patch_of(&invoices[2]));

    let dialect = PostgresDialect::new();
    println!("-- dialect: {}", dialect.name());
    println!();

    let opts = CompilerOptions::new(&dialect, &patches);
    print_statements("one statement per patch", &DefaultCompiler::new().compile(&opts));
    print_statements("bulk", &BulkCompiler::new().compile(&opts));
    print_statements(
        "bulk, at most 2 patches each",
        &BulkCompiler::new().max_patches(2).compile(&opts),
    );

    // -------------------------------------------------------------------------
    // SCOPE CACHE
    // -------------------------------------------------------------------------
    let sc = ScopeCache::new(Arc::clone(&meta));
    for client in clients {
        sc.add_object(Arc::new(client));
    }
    for invoice in invoices {
        let invoice: Arc<dyn Entity> = Arc::new(invoice);
        sc.add_object(invoice);
    }

    let mut out = Vec::new();
    if sc.dump(&mut out).is_ok() {
        println!("{}", String::from_utf8_lossy(&out));
    }
}
