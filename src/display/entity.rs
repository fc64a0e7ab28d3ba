//! Domain entity display formatting

use crate::models::{Bet, Draw, GameType, User};

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:02}", n))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_user_list(users: &[User]) -> String {
    if users.is_empty() {
        return "No users found.".to_string();
    }

    let name_width = users.iter().map(|u| u.name.len()).max().unwrap_or(4).max(4);
    let mut output = format!(
        "{:<12}  {:<name_width$}  {}\n",
        "ID",
        "Name",
        "Email",
        name_width = name_width
    );
    for user in users {
        output.push_str(&format!(
            "{:<12}  {:<name_width$}  {}\n",
            user.id.to_string(),
            user.name,
            user.email,
            name_width = name_width
        ));
    }
    output
}

pub fn format_game_list(games: &[GameType]) -> String {
    if games.is_empty() {
        return "No game types found.".to_string();
    }

    let name_width = games.iter().map(|g| g.name.len()).max().unwrap_or(4).max(4);
    let mut output = format!(
        "{:<12}  {:<name_width$}  {}\n",
        "ID",
        "Name",
        "Shape",
        name_width = name_width
    );
    for game in games {
        output.push_str(&format!(
            "{:<12}  {:<name_width$}  {} of 1-{}\n",
            game.id.to_string(),
            game.name,
            game.picks,
            game.max_number,
            name_width = name_width
        ));
    }
    output
}

pub fn format_draw_list(draws: &[Draw]) -> String {
    if draws.is_empty() {
        return "No draws found.".to_string();
    }

    let mut output = format!("{:<12}  {:<12}  {:<16}  {}\n", "ID", "Game", "Drawn", "Numbers");
    for draw in draws {
        output.push_str(&format!(
            "{:<12}  {:<12}  {:<16}  {}\n",
            draw.id.to_string(),
            draw.game_type_id.to_string(),
            draw.drawn_at.format("%Y-%m-%d %H:%M").to_string(),
            join_numbers(&draw.numbers)
        ));
    }
    output
}

pub fn format_bet_list(bets: &[Bet]) -> String {
    if bets.is_empty() {
        return "No bets found.".to_string();
    }

    let mut output = format!("{:<12}  {:<12}  {:<12}  {}\n", "ID", "User", "Game", "Numbers");
    for bet in bets {
        output.push_str(&format!(
            "{:<12}  {:<12}  {:<12}  {}\n",
            bet.id.to_string(),
            bet.user_id.to_string(),
            bet.game_type_id.to_string(),
            join_numbers(&bet.numbers)
        ));
    }
    output
}
