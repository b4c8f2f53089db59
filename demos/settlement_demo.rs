use box_office_settlement::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("🎬 Box Office Settlement Demo\n");

    let config = BoxOfficeConfig::default();
    let engine = SettlementEngine::new(config.clone())?;

    let sales = [
        // (section, row, price class, tickets, online)
        (0, 0, "120", "10", "2"),
        (0, 1, "80", "4", "0"),
        (1, 0, "150", "32", "12"),
        (3, 2, "60", "55", "5"),
    ];

    let mut monday = engine.new_report("Week 1", "Night Train", "Monday");
    for (section, row, class, tickets, online) in sales {
        monday = engine.apply_edit(&monday, section, row, RowField::PriceClass, class)?;
        monday = engine.apply_edit(&monday, section, row, RowField::TicketCount, tickets)?;
        monday = engine.apply_edit(&monday, section, row, RowField::OnlineCount, online)?;
    }

    for section in &monday.sections {
        let t = &section.totals;
        println!(
            "{:<14} tickets {:>5}  gross {:>10.2}  nett {:>10.2}  gst18 {:>8.2}  gst12 {:>8.2}",
            section.title, t.tickets, t.gross, t.nett, t.gst18, t.gst12
        );
    }

    if let Some(all) = &monday.all_total {
        println!(
            "{:<14} tickets {:>5}  gross {:>10.2}  nett {:>10.2}",
            "All Total", all.tickets, all.gross, all.nett
        );
    }

    let mut tuesday = engine.new_report("Week 1", "Quiet Harbour", "Tuesday");
    tuesday = engine.apply_edit(&tuesday, 2, 0, RowField::PriceClass, "90")?;
    tuesday = engine.apply_edit(&tuesday, 2, 0, RowField::TicketCount, "70")?;

    let documents = vec![
        encode_report(&monday.finalize())?,
        encode_report(&tuesday.finalize())?,
    ];
    let summary = analyze_documents(&config, &documents)?;

    println!("\n📊 Analytics over {} reports", summary.total_report_count);
    for (label, tickets) in summary
        .show_slot_labels
        .iter()
        .zip(&summary.tickets_by_show_slot)
    {
        println!("  {:<16} {:>6}", label, tickets);
    }
    for day in summary.revenue_by_day.iter() {
        println!("  {:<16} {:>10.2}", day.key, day.amount);
    }
    for movie in &summary.top_movies {
        println!("  🎟  {:<16} {:>6}", movie.title, movie.tickets);
    }

    Ok(())
}
