use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use michifumi::build::build_site;
use michifumi::config::Config;
use michifumi::filter::ALL_TAG;
use michifumi::listing::{bind, Binding, Card, SearchInput, TagButton};
use michifumi::search::{load_payload, Document};
use std::collections::BTreeSet;
use std::path::Path;

fn main() {
    env_logger::init();

    let project_arg = Arg::with_name("project")
        .short("C")
        .long("project")
        .help("Directory to search for michifumi.yaml")
        .takes_value(true)
        .default_value(".");
    let output_arg = Arg::with_name("output")
        .short("o")
        .long("output")
        .help("Output directory for the built site")
        .takes_value(true)
        .default_value("./_output");

    let matches = App::new("michifumi")
        .about("Static site generator for Michifumi's blog")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Build the site")
                .arg(project_arg.clone())
                .arg(output_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("search")
                .about("Query a built site's search payload the way the listing page does")
                .arg(Arg::with_name("query").help("Query text").index(1))
                .arg(
                    Arg::with_name("tag")
                        .short("t")
                        .long("tag")
                        .help("Restrict results to a tag; repeat to OR tags together")
                        .takes_value(true)
                        .multiple(true),
                )
                .arg(output_arg),
        )
        .get_matches();

    let result = match matches.subcommand() {
        ("build", Some(matches)) => run_build(matches),
        ("search", Some(matches)) => run_search(matches),
        _ => unreachable!("clap requires a subcommand"),
    };

    if let Err(err) = result {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

fn run_build(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_directory(
        Path::new(matches.value_of("project").unwrap()),
        Path::new(matches.value_of("output").unwrap()),
    )?;
    build_site(config)?;
    Ok(())
}

// Runs a query through the same loader/engine/listing path the browser
// uses, against the `search.json` a build wrote.
fn run_search(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let output = Path::new(matches.value_of("output").unwrap());
    let query = matches.value_of("query").unwrap_or("");

    let blob = std::fs::read_to_string(output.join("search.json")).ok();
    let payload = load_payload(None, blob.as_deref());

    let cards: Vec<Card> = payload
        .iter()
        .map(|document| Card::new(document.id.clone(), document.tags.clone()))
        .collect();
    let keys: BTreeSet<&str> = payload
        .iter()
        .flat_map(|document| document.tags.iter().map(String::as_str))
        .collect();
    let mut buttons = vec![TagButton::new(ALL_TAG, Some("All"))];
    buttons.extend(keys.into_iter().map(|key| TagButton::new(key, None)));

    let mut input = SearchInput::new();
    match bind(&mut input, cards, buttons, payload.clone(), Some(query)) {
        Some(Binding::Filter(mut controller)) => {
            if let Some(tags) = matches.values_of("tag") {
                for tag in tags {
                    controller.click_tag(tag);
                }
            }
            if let Some(indicator) = controller.listing().indicator() {
                println!("{}", indicator);
            }
            if controller.listing().empty_state_visible() {
                println!("no matching posts");
                return Ok(());
            }
            for card in controller.listing().cards() {
                if !card.is_hidden() {
                    println!("{}\t{}", card.id(), title_of(&payload, card.id()));
                }
            }
            Ok(())
        }
        // No cards means no payload; report where the listing page would
        // send this query instead.
        Some(Binding::Redirect(redirect)) => {
            println!("no search payload at `{}`", output.display());
            println!("a listing page would navigate to: {}", redirect.submit(query));
            Ok(())
        }
        Some(Binding::Inert) | None => Ok(()),
    }
}

fn title_of<'a>(payload: &'a [Document], id: &str) -> &'a str {
    payload
        .iter()
        .find(|document| document.id == id)
        .map(|document| document.title.as_str())
        .unwrap_or("")
}
