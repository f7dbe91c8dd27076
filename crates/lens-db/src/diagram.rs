//! Entity-relationship diagram of the live schema.
//!
//! The layout is read back from SQLite itself (`sqlite_master` plus the
//! `table_info` / `foreign_key_list` pragmas), emitted as Graphviz DOT and
//! optionally handed to the `dot` tool for rendering.

use std::fmt::Write as _;
use std::path::Path;
use std::process::Command;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::{Database, DbError, Result};

struct Column {
    name: String,
    decl_type: String,
    not_null: bool,
    primary_key: bool,
}

struct ForeignKey {
    from: String,
    table: String,
    to: String,
}

struct Table {
    name: String,
    columns: Vec<Column>,
    foreign_keys: Vec<ForeignKey>,
}

/// DOT source for every application table. `schema_version` is bookkeeping
/// and left out.
pub fn er_dot(db: &Database) -> Result<String> {
    let tables = db.with_conn(load_tables)?;

    let mut out = String::new();
    out.push_str("digraph lens {\n");
    out.push_str("    rankdir=LR;\n");
    out.push_str("    node [shape=record, fontname=\"Helvetica\"];\n");
    // Crow's foot sits on the referencing (many) side of each edge.
    out.push_str("    edge [dir=back, arrowtail=crow, arrowhead=none, fontsize=10];\n\n");

    for table in &tables {
        let mut fields = vec![format!("<__title> {}", escape(&table.name))];
        for col in &table.columns {
            let is_fk = table.foreign_keys.iter().any(|fk| fk.from == col.name);
            let mut marks = Vec::new();
            if col.primary_key {
                marks.push("PK");
            }
            if is_fk {
                marks.push("FK");
            }
            if col.not_null && !col.primary_key {
                marks.push("NOT NULL");
            }

            let mut field = format!("<{0}> {0} : {1}", escape(&col.name), escape(&col.decl_type));
            if !marks.is_empty() {
                let _ = write!(field, " ({})", marks.join(", "));
            }
            fields.push(field);
        }
        let _ = writeln!(
            out,
            "    \"{}\" [label=\"{{{}}}\"];",
            table.name,
            fields.join("\\l|")
        );
    }

    out.push('\n');
    for table in &tables {
        for fk in &table.foreign_keys {
            let _ = writeln!(
                out,
                "    \"{}\":\"{}\" -> \"{}\":\"{}\" [label=\"{}\"];",
                table.name, fk.from, fk.table, fk.to, fk.from
            );
        }
    }
    out.push_str("}\n");

    Ok(out)
}

/// Write `<output>.dot` and, unless `output` is itself a `.dot` file, run
/// `dot_bin` to render it in the format named by the output's extension.
pub fn render_er(db: &Database, output: &Path, dot_bin: &str) -> Result<()> {
    let source = er_dot(db)?;

    let dot_path = output.with_extension("dot");
    std::fs::write(&dot_path, &source)?;
    debug!("Wrote DOT source to {}", dot_path.display());

    let format = match output.extension().and_then(|ext| ext.to_str()) {
        Some("dot") => {
            info!("ER diagram written to {}", output.display());
            return Ok(());
        }
        Some(ext) => ext,
        None => "png",
    };

    let status = Command::new(dot_bin)
        .arg(format!("-T{format}"))
        .arg("-o")
        .arg(output)
        .arg(&dot_path)
        .status()
        .map_err(|e| DbError::Diagram(format!("failed to run {dot_bin}: {e}")))?;

    if !status.success() {
        return Err(DbError::Diagram(format!("{dot_bin} exited with {status}")));
    }

    info!("ER diagram written to {}", output.display());
    Ok(())
}

fn load_tables(conn: &Connection) -> Result<Vec<Table>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT GLOB 'sqlite_*' AND name != 'schema_version'
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut col_stmt = conn.prepare(
        "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid",
    )?;
    let mut fk_stmt = conn.prepare(
        "SELECT \"from\", \"table\", \"to\" FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
    )?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let columns = col_stmt
            .query_map([&name], |row| {
                Ok(Column {
                    name: row.get(0)?,
                    decl_type: row.get(1)?,
                    not_null: row.get(2)?,
                    primary_key: row.get::<_, i64>(3)? > 0,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let foreign_keys = fk_stmt
            .query_map([&name], |row| {
                Ok(ForeignKey {
                    from: row.get(0)?,
                    table: row.get(1)?,
                    to: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tables.push(Table {
            name,
            columns,
            foreign_keys,
        });
    }

    Ok(tables)
}

/// Escape the characters that carry meaning inside a DOT record label.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '{' | '}' | '|' | '<' | '>' | '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_lists_every_table() {
        let db = Database::open_in_memory().unwrap();
        let dot = er_dot(&db).unwrap();

        assert!(dot.starts_with("digraph lens {"));
        for table in ["user", "post", "comment", "follower"] {
            assert!(dot.contains(&format!("\"{table}\" [label=")), "missing {table}");
        }
        assert!(!dot.contains("schema_version"));
        assert!(dot.contains("email : TEXT (NOT NULL)"));
        assert!(dot.contains("id : INTEGER (PK)"));
    }

    #[test]
    fn dot_has_one_edge_per_foreign_key() {
        let db = Database::open_in_memory().unwrap();
        let dot = er_dot(&db).unwrap();

        let edges: Vec<&str> = dot.lines().filter(|l| l.contains("->")).collect();
        assert_eq!(edges.len(), 5);
        assert!(dot.contains("\"comment\":\"post_id\" -> \"post\":\"id\""));
        assert!(dot.contains("\"follower\":\"follower_id\" -> \"user\":\"id\""));
        assert!(dot.contains("\"follower\":\"user_id\" -> \"user\":\"id\""));
    }

    #[test]
    fn escape_record_specials() {
        assert_eq!(escape("a|b"), "a\\|b");
        assert_eq!(escape("{x}"), "\\{x\\}");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn crow_foot_marks_the_referencing_side() {
        let db = Database::open_in_memory().unwrap();
        let dot = er_dot(&db).unwrap();

        assert!(dot.contains("edge [dir=back, arrowtail=crow, arrowhead=none"));
        assert!(!dot.contains("arrowhead=crow"));
    }

    #[test]
    fn render_to_dot_needs_no_tool() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("schema.dot");

        render_er(&db, &output, "lens-no-such-binary").unwrap();
        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("digraph lens"));
    }

    #[test]
    fn render_with_missing_tool_fails_cleanly() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("diagram.png");

        let err = render_er(&db, &output, "lens-no-such-binary").unwrap_err();
        assert!(matches!(err, DbError::Diagram(_)));
        assert!(!output.exists());

        // The DOT source is still left behind for manual rendering.
        assert!(output.with_extension("dot").exists());
    }
}
