use revgeo::prelude::*;

fn main() -> Result<()> {
    // Set RUST_LOG=info to see build timings
    env_logger::init();

    println!("=== revgeo - Getting Started ===\n");

    // A gazetteer is usually loaded from a table; a few rows are enough here.
    let mut table = RecordTable::canonical();
    table.push_row([
        "37.77493",
        "-122.41942",
        "San Francisco",
        "California",
        "San Francisco County",
        "US",
    ]);
    table.push_row(["41.85003", "-87.65005", "Chicago", "Illinois", "Cook County", "US"]);
    table.push_row(["48.85341", "2.3488", "Paris", "Ile-de-France", "Paris", "FR"]);
    table.push_row(["35.6895", "139.69171", "Tokyo", "Tokyo", "", "JP"]);
    table.push_row(["-33.86785", "151.20732", "Sydney", "New South Wales", "", "AU"]);

    let geocoder = GeocoderBuilder::new().table(table).workers(2).build()?;
    println!(
        "Indexed {} places with {} workers\n",
        geocoder.len(),
        geocoder.workers()
    );

    // Single lookup
    let hit = geocoder.query_one_with_distance((37.78674, -122.39222))?;
    println!(
        "(37.78674, -122.39222) -> {} ({:.1} km)",
        hit.record.name().unwrap_or("?"),
        hit.distance
    );

    // Batch lookup, answers come back in input order
    let queries = [
        Coordinate::new(41.852968, -87.725730),
        Coordinate::new(48.836364, 2.357422),
        Coordinate::new(35.0, 139.0),
        Coordinate::new(-34.0, 151.0),
    ];
    for (query, place) in queries.iter().zip(geocoder.query_many(&queries)?) {
        println!(
            "({}, {}) -> {}, {}",
            query.lat,
            query.lon,
            place.name().unwrap_or("?"),
            place.country_code().unwrap_or("?")
        );
    }

    // Invalid input is reported, not guessed at
    match geocoder.query_one((f64::NAN, 0.0)) {
        Err(e) => println!("\nRejected query: {}", e),
        Ok(place) => println!("\nUnexpected answer: {:?}", place),
    }

    Ok(())
}
