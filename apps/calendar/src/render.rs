use schedule_cell::{CalendarCell, CalendarGrid, SlotStatus};

const LABEL_WIDTH: usize = 13;
const CELL_WIDTH: usize = 9;

fn glyph(status: SlotStatus) -> &'static str {
    match status {
        SlotStatus::Empty => ".",
        SlotStatus::DoctorFree => "free",
        SlotStatus::BookedByUser => "mine",
        SlotStatus::BookedByOther => "booked",
        SlotStatus::Past => "-",
    }
}

fn cell_text(cell: &CalendarCell) -> String {
    // Elapsed cells keep showing what they held, dimmed into brackets.
    match (cell.status, cell.occupancy) {
        (SlotStatus::Past, SlotStatus::Empty) => glyph(SlotStatus::Past).to_string(),
        (SlotStatus::Past, occupancy) => format!("({})", glyph(occupancy)),
        (status, _) => glyph(status).to_string(),
    }
}

/// Renders the week as a text table: one row per time slot, one column per day.
pub fn render_grid(grid: &CalendarGrid, title: &str) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} | week of {} | as of {}\n",
        title,
        grid.days[0].format("%Y-%m-%d"),
        grid.evaluated_at.format("%H:%M")
    ));

    out.push_str(&format!("{:<width$}", "", width = LABEL_WIDTH));
    for day in &grid.days {
        out.push_str(&format!("{:^width$}", day.format("%a %d/%m").to_string(), width = CELL_WIDTH + 1));
    }
    out.push('\n');

    for (slot, row) in grid.slots.iter().zip(&grid.rows) {
        out.push_str(&format!("{:<width$}", slot.label(), width = LABEL_WIDTH));
        for cell in row {
            out.push_str(&format!("{:^width$}", cell_text(cell), width = CELL_WIDTH + 1));
        }
        out.push('\n');
    }

    out.push_str("legend: . empty | free open slot | mine your booking | booked taken | - past\n");
    out
}
