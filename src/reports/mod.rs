use cipherforge::api::{SolutionResult, TranspositionResult};
use cipherforge::cipher::Cipher;
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

/// Lays `values` out on the cipher's grid.
pub fn print_grid(title: &str, values: &[String], columns: usize) {
    println!("\n{}", title);
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    for chunk in values.chunks(columns.max(1)) {
        let cells: Vec<Cell> = chunk
            .iter()
            .map(|v| Cell::new(v).set_alignment(CellAlignment::Center))
            .collect();
        table.add_row(cells);
    }
    println!("{}", table);
}

pub fn print_solution(result: &SolutionResult, cipher: &Cipher) {
    let plain: Vec<String> = result.decoded().chars().map(|c| c.to_string()).collect();
    print_grid("Decoded:", &plain, cipher.columns);

    let mut key = Table::new();
    key.load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    key.add_row(vec![
        Cell::new("Symbol").add_attribute(Attribute::Bold),
        Cell::new("Letter").fg(Color::Green),
    ]);
    for (symbol, letter) in result.mapping() {
        key.add_row(vec![
            Cell::new(symbol),
            Cell::new(letter).fg(Color::Green),
        ]);
    }
    println!("\n{}", key);

    print_epochs(result);

    println!(
        "\n🏆 Best: score {:.4} | log-prob {:.2} | IoC {:.5} (epoch {}, iteration {})",
        result.best.score,
        result.best.log_probability,
        result.best.coincidence,
        result.best.epoch,
        result.best.iteration
    );
    if let Some(o) = &result.oracle_best {
        println!(
            "🎯 Closest to known plaintext: {:.1}% at score {:.4}\n   {}",
            o.proximity, o.solution.score, o.solution.plaintext
        );
    }
    if result.cancelled {
        println!("⚠️  Search was cancelled before every iteration ran.");
    }
}

fn print_epochs(result: &SolutionResult) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Epoch").add_attribute(Attribute::Bold),
        Cell::new("Best").fg(Color::Cyan),
        Cell::new("Iters"),
        Cell::new("Status"),
    ]);
    for i in 1..=2 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    for e in &result.epochs {
        let status = if e.cancelled {
            Cell::new("cancelled").fg(Color::Red)
        } else {
            Cell::new("done")
        };
        table.add_row(vec![
            Cell::new(e.epoch),
            Cell::new(format!("{:.4}", e.best_score)).fg(Color::Cyan),
            Cell::new(e.iterations_completed),
            status,
        ]);
    }
    println!("\n{}", table);
}

pub fn print_transposition(result: &TranspositionResult, unwrapped: &Cipher) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Length").add_attribute(Attribute::Bold),
        Cell::new("Key"),
        Cell::new("Repeats").fg(Color::Cyan),
    ]);
    if let Some(col) = table.column_mut(2) {
        col.set_cell_alignment(CellAlignment::Right);
    }

    for c in &result.candidates {
        let is_best = c.key_length == result.key_length;
        let mut length = Cell::new(c.key_length);
        if is_best {
            length = length.add_attribute(Attribute::Bold).fg(Color::Green);
        }
        table.add_row(vec![
            length,
            Cell::new(format!("{:?}", c.key_permutation)),
            Cell::new(format!("{:.0}", c.bigram_score)).fg(Color::Cyan),
        ]);
    }
    println!("\n{}", table);

    let values: Vec<String> = unwrapped.values().iter().map(|v| v.to_string()).collect();
    let width = if result.key_length > 0 {
        result.key_length
    } else {
        unwrapped.columns
    };
    print_grid("Unwrapped:", &values, width);

    println!(
        "\n🏆 Best key {:?} (length {}) with {:.0} repeated bigrams",
        result.key_permutation, result.key_length, result.bigram_score
    );
    if result.cancelled {
        println!("⚠️  Search was cancelled before every iteration ran.");
    }
}
