use crate::backend::{Hotel, HttpAssistantBackend};
use crate::cli::HotelCommand;
use crate::config::Config;
use crate::error::Result;
use colored::Colorize;
use prettytable::{format, Table};

/// Handle hotel lookup commands
pub async fn handle_hotels(config: &Config, command: HotelCommand) -> Result<()> {
    let backend = HttpAssistantBackend::new(&config.backend)?;

    match command {
        HotelCommand::Search { query } => {
            let hotels = backend.search_hotels(&query).await?;
            if hotels.is_empty() {
                println!("{}", format!("No hotels found for \"{}\".", query).yellow());
                return Ok(());
            }
            print_hotels(&hotels);
        }
        HotelCommand::Show { id } => match backend.hotel_details(&id).await? {
            Some(hotel) => print_hotel(&hotel),
            None => println!("{}", format!("No hotel with id {}", id).yellow()),
        },
    }

    Ok(())
}

fn print_hotels(hotels: &[Hotel]) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "ID".bold(),
        "Name".bold(),
        "Location".bold(),
        "Price".bold(),
        "Rating".bold()
    ]);

    for hotel in hotels {
        table.add_row(prettytable::row![
            hotel.id.cyan(),
            hotel.name,
            hotel.location,
            format!("{:.2}", hotel.price),
            format!("{:.1}", hotel.rating)
        ]);
    }

    table.printstd();
}

fn print_hotel(hotel: &Hotel) {
    println!("\n{} {}", hotel.name.bold(), format!("({})", hotel.id).dimmed());
    println!("  Location: {}", hotel.location);
    println!("  Price:    {:.2} per night", hotel.price);
    println!("  Rating:   {:.1}", hotel.rating);
    if !hotel.amenities.is_empty() {
        println!("  Amenities: {}", hotel.amenities.join(", "));
    }
    if !hotel.description.is_empty() {
        println!("\n{}", hotel.description);
    }
    println!();
}
