use focusguard_core::storage::Database;

pub fn run(limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let records = db.recent_interventions(limit)?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
