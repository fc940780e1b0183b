use pretty_assertions::assert_eq;
use sponsor_bot::command::{CommandContext, CommandHandler, DONE, FAILED, THINKING, UNRECOGNIZED};
use sponsor_bot::config::BotConfig;
use sponsor_core::{Invocation, TagNames, SPACES_PER_CONTAINER};
use sponsor_platform::{
    ChannelId, MemberId, MemoryPlatform, Operation, Platform, TagId, WorkspaceBuilder, BOT_ID,
};
use std::sync::Arc;

fn config() -> BotConfig {
    BotConfig {
        prefix: "!".to_string(),
        tags: TagNames::default(),
        quota: 5,
        greeting: "Welcome @name, say hi!".to_string(),
        banned_prefixes: vec!["!!".to_string()],
    }
}

struct Bot {
    platform: Arc<MemoryPlatform>,
    handler: Arc<CommandHandler>,
}

impl Bot {
    fn new(ws: &WorkspaceBuilder) -> Self {
        let platform = Arc::new(ws.platform());
        let handler = Arc::new(CommandHandler::new(platform.clone(), config()));
        Self { platform, handler }
    }

    async fn say(&self, member: MemberId, channel: ChannelId, text: &str) -> anyhow::Result<()> {
        let caller = self.platform.member(member).await.expect("member");
        let message = self.platform.post(channel, member, text).await;
        let invocation = Invocation {
            caller,
            channel,
            message,
            mentions: sponsor_bot::console::parse_mentions(text),
        };
        self.handler
            .handle(CommandContext::Community(invocation), text)
            .await
    }

    async fn replies(&self) -> Vec<String> {
        self.platform
            .sent_messages()
            .await
            .into_iter()
            .map(|m| m.content)
            .collect()
    }

    async fn reactions(&self) -> Vec<String> {
        self.platform
            .snapshot()
            .await
            .reactions
            .into_iter()
            .map(|r| r.emoji)
            .collect()
    }
}

struct Guild {
    ws: WorkspaceBuilder,
    container: TagId,
    sponsor: TagId,
    sponsee: TagId,
    lobby: ChannelId,
}

fn guild() -> Guild {
    let mut ws = WorkspaceBuilder::new("Guild");
    let container = ws.tag("Sponsor Channel");
    let sponsor = ws.tag("Sponsor");
    let sponsee = ws.tag("Sponsee");
    ws.give_tag(BOT_ID, sponsor);
    let hall = ws.container("Hall", 0, &[]);
    let lobby = ws.text_channel("lobby", hall);
    Guild {
        ws,
        container,
        sponsor,
        sponsee,
        lobby,
    }
}

#[tokio::test]
async fn sponsor_creates_space_and_greets_owner() {
    let mut g = guild();
    let q = g.ws.member("Q", &[]);
    let alpha = g.ws.container("alpha 1", 1, &[g.container]);
    let bot = Bot::new(&g.ws);

    bot.say(q, g.lobby, "!sponsor alpha nation x").await.expect("handled");

    let space = bot
        .platform
        .channels()
        .await
        .expect("channels")
        .into_iter()
        .find(|c| c.name == "Q-nationx")
        .expect("space created");
    assert_eq!(space.parent, Some(alpha));
    assert_eq!(
        bot.replies().await,
        vec![
            format!("Created <#{}>", space.id),
            format!("Welcome <@{q}>, say hi!"),
        ]
    );
    let greeting = bot
        .platform
        .recent_messages(space.id, 1)
        .await
        .expect("messages");
    assert_eq!(greeting[0].author, BOT_ID);

    let member = bot.platform.member(q).await.expect("member");
    assert!(member.has_tag(g.sponsee));
    assert_eq!(bot.reactions().await, vec![DONE.to_string()]);
}

#[tokio::test]
async fn sponsor_requires_family_and_name() {
    let mut g = guild();
    let q = g.ws.member("Q", &[]);
    let bot = Bot::new(&g.ws);

    bot.say(q, g.lobby, "!sponsor alpha").await.expect("handled");
    assert_eq!(
        bot.replies().await,
        vec!["Please format the request in `!sponsor <FAMILY> <NAME>`".to_string()]
    );
}

#[tokio::test]
async fn over_quota_lists_owned_spaces() {
    let mut g = guild();
    let q = g.ws.member("Q", &[]);
    let alpha = g.ws.container("alpha 1", 1, &[g.container]);
    let owned: Vec<ChannelId> = (0..6)
        .map(|n| g.ws.space(&format!("Q-{n}"), alpha, &[q], &[]))
        .collect();
    let bot = Bot::new(&g.ws);

    bot.say(q, g.lobby, "!sponsor alpha more").await.expect("handled");

    let listing: Vec<String> = owned.iter().map(|id| format!("<#{id}>")).collect();
    assert_eq!(
        bot.replies().await,
        vec![
            "You are at capacity!".to_string(),
            format!("Found: {}", listing.join(" ")),
        ]
    );
}

#[tokio::test]
async fn unknown_family_and_out_of_room_are_reported() {
    let mut g = guild();
    let q = g.ws.member("Q", &[]);
    let beta = g.ws.container("beta 1", 1, &[g.container]);
    g.ws.fill(beta, SPACES_PER_CONTAINER);
    let bot = Bot::new(&g.ws);

    bot.say(q, g.lobby, "!sponsor gamma x").await.expect("handled");
    bot.say(q, g.lobby, "!sponsor beta x").await.expect("handled");

    let replies = bot.replies().await;
    assert_eq!(replies[0], "Unrecognized family! Recognized families: \"beta\"");
    assert!(replies[1].starts_with("Created <#"));
    assert!(bot
        .platform
        .channels()
        .await
        .expect("channels")
        .iter()
        .any(|c| c.name == "beta 2"));
}

#[tokio::test]
async fn unrecognized_command_gets_a_thumbs_down() {
    let mut g = guild();
    let q = g.ws.member("Q", &[]);
    let bot = Bot::new(&g.ws);

    bot.say(q, g.lobby, "!dance").await.expect("handled");

    assert_eq!(
        bot.replies().await,
        vec!["Unrecognized command! try !help for a list of commands".to_string()]
    );
    let reactions = bot.reactions().await;
    assert_eq!(reactions, vec![UNRECOGNIZED.to_string()]);
    assert!(!reactions.contains(&THINKING.to_string()));
}

#[tokio::test]
async fn ignores_unprefixed_banned_and_direct_messages() {
    let mut g = guild();
    let q = g.ws.member("Q", &[]);
    let bot = Bot::new(&g.ws);

    bot.say(q, g.lobby, "sponsor alpha x").await.expect("handled");
    bot.say(q, g.lobby, "!!roll 2d6").await.expect("handled");
    bot.handler
        .handle(CommandContext::Direct, "!help")
        .await
        .expect("handled");

    assert!(bot.replies().await.is_empty());
    assert!(bot.reactions().await.is_empty());
}

#[tokio::test]
async fn platform_failure_flags_the_command_and_surfaces_the_error() {
    let mut g = guild();
    let q = g.ws.member("Q", &[]);
    g.ws.container("alpha 1", 1, &[g.container]);
    let bot = Bot::new(&g.ws);
    bot.platform.fail_on(Operation::CreateSpace).await;

    let err = bot
        .say(q, g.lobby, "!sponsor alpha x")
        .await
        .expect_err("create fails");
    assert!(format!("{err:#}").contains("sponsor failed"));
    assert_eq!(bot.reactions().await, vec![FAILED.to_string()]);

    bot.platform.clear_failures().await;
    bot.say(q, g.lobby, "!sponsor alpha x").await.expect("handler keeps serving");
    assert!(bot.reactions().await.contains(&DONE.to_string()));
}

#[tokio::test]
async fn init_twice_reports_once_and_then_only_to_sponsors() {
    let mut ws = WorkspaceBuilder::new("Fresh");
    let hall = ws.container("Hall", 0, &[]);
    let lobby = ws.text_channel("lobby", hall);
    let p = ws.member("P", &[]);
    let bot = Bot::new(&ws);

    bot.say(p, lobby, "!init").await.expect("handled");
    let first = bot.replies().await;
    assert_eq!(first.len(), 4);
    assert!(first[0].ends_with("as sponsee role"));
    assert!(first[1].ends_with("as sponsor role"));
    assert!(first[2].ends_with("as sponsor channel role"));
    assert_eq!(first[3], "Initialized Fresh");

    let bot_member = bot.platform.bot_member().await.expect("bot");
    let sponsor = bot
        .platform
        .tags()
        .await
        .expect("tags")
        .into_iter()
        .find(|t| t.name == "Sponsor")
        .expect("sponsor tag");
    assert!(bot_member.has_tag(sponsor.id));

    bot.say(p, lobby, "!init").await.expect("handled");
    assert_eq!(bot.replies().await.len(), 4);

    bot.platform.add_member_tag(p, sponsor.id).await.expect("tag");
    bot.say(p, lobby, "!init").await.expect("handled");
    assert_eq!(bot.replies().await.last().map(String::as_str), Some("Already initialized"));
}

#[tokio::test]
async fn init_lists_missing_permissions() {
    let mut g = guild();
    g.ws.bot_permissions(
        sponsor_platform::Permissions::VIEW_CHANNEL | sponsor_platform::Permissions::SEND_MESSAGES,
    );
    let s = g.ws.member("S", &[g.sponsor]);
    let bot = Bot::new(&g.ws);

    bot.say(s, g.lobby, "!init").await.expect("handled");
    let replies = bot.replies().await;
    assert!(replies[0].starts_with("Missing permissions!\n"));
    assert!(replies[0].contains("MANAGE_ROLES"));
    assert!(!replies[0].contains("VIEW_CHANNEL"));
}

#[tokio::test]
async fn find_looks_up_mentioned_member_for_sponsors_only() {
    let mut g = guild();
    let s = g.ws.member("S", &[g.sponsor]);
    let p = g.ws.member("P", &[]);
    let r = g.ws.member("R", &[]);
    let alpha = g.ws.container("alpha 1", 1, &[g.container]);
    let p_space = g.ws.space("P-x", alpha, &[p], &[]);
    let bot = Bot::new(&g.ws);

    bot.say(s, g.lobby, &format!("!find <@{p}>")).await.expect("handled");
    bot.say(r, g.lobby, &format!("!find <@{p}>")).await.expect("handled");

    assert_eq!(
        bot.replies().await,
        vec![format!("Found: <#{p_space}>"), "Found: ".to_string()]
    );
}

#[tokio::test]
async fn rename_checks_ownership_and_moves_space() {
    let mut g = guild();
    let p = g.ws.member("P", &[]);
    let r = g.ws.member("R", &[]);
    let alpha = g.ws.container("alpha 1", 1, &[g.container]);
    g.ws.container("beta 1", 2, &[g.container]);
    let space = g.ws.space("P-old", alpha, &[p], &[g.sponsor]);
    let bot = Bot::new(&g.ws);

    bot.say(r, space, "!rename beta mine").await.expect("handled");
    bot.say(p, g.lobby, "!rename beta elsewhere").await.expect("handled");
    bot.say(p, space, "!rename beta new").await.expect("handled");

    assert_eq!(
        bot.replies().await,
        vec![
            "Only channel owners may use this command".to_string(),
            format!("Renamed to <#{space}>"),
        ]
    );
    assert_eq!(bot.platform.channel(space).await.expect("space").name, "P-new");
}

#[tokio::test]
async fn stales_report_both_classes_to_sponsors() {
    let mut g = guild();
    let s = g.ws.member("S", &[g.sponsor]);
    let p = g.ws.member("P", &[]);
    let alpha = g.ws.container("alpha 1", 1, &[g.container]);
    let gone = g.ws.space("S-gone", alpha, &[s], &[g.sponsor]);
    let quiet = g.ws.space("P-quiet", alpha, &[p], &[g.sponsor]);
    g.ws.message(quiet, p, "anyone?", chrono::Duration::days(10));
    let bot = Bot::new(&g.ws);

    bot.say(p, g.lobby, "!stales 1d").await.expect("handled");
    assert!(bot.replies().await.is_empty());

    bot.say(s, g.lobby, "!stales 2d 12h").await.expect("handled");
    let replies = bot.replies().await;
    assert_eq!(replies[0], format!("Only Sponsor:\n<#{gone}>"));
    assert!(replies[1].starts_with("Idle since "));
    assert!(replies[1].ends_with(&format!(":\n<#{quiet}>")));

    bot.say(s, g.lobby, "!stales -1d").await.expect("handled");
    assert!(bot
        .replies()
        .await
        .last()
        .is_some_and(|r| r.starts_with("Negative times aren't allowed!")));
}

#[tokio::test]
async fn findsponsees_and_backfill() {
    let mut g = guild();
    let s = g.ws.member("S", &[g.sponsor]);
    let p = g.ws.member("P", &[]);
    let alpha = g.ws.container("alpha 1", 1, &[g.container]);
    let unattended = g.ws.space("P-x", alpha, &[p], &[g.sponsor]);
    g.ws.message(unattended, p, "hello", chrono::Duration::hours(2));
    let bot = Bot::new(&g.ws);

    bot.say(s, g.lobby, "!findsponsees").await.expect("handled");
    bot.say(s, g.lobby, "!bulkapplysponseetag").await.expect("handled");

    assert_eq!(
        bot.replies().await,
        vec![
            format!("Found 1 channels\n<#{unattended}>"),
            format!("Added <@&{}> to 1 users", g.sponsee),
        ]
    );
}

#[tokio::test]
async fn drn_is_limited_to_sponsors_and_owned_spaces() {
    let mut g = guild();
    let p = g.ws.member("P", &[]);
    let alpha = g.ws.container("alpha 1", 1, &[g.container]);
    let own = g.ws.space("P-x", alpha, &[p], &[]);
    let bot = Bot::new(&g.ws);

    bot.say(p, g.lobby, "!drn 5 vs 3").await.expect("handled");
    assert!(bot.replies().await.is_empty());

    bot.say(p, own, "!drn 5 vs 3").await.expect("handled");
    bot.say(p, own, "!drn lots").await.expect("handled");
    let replies = bot.replies().await;
    assert!(replies[0].starts_with("```") && replies[0].contains("5 vs 3"));
    assert_eq!(replies[1], "Unrecognized input");
}

#[tokio::test]
async fn help_shows_sponsor_extras_to_sponsors() {
    let mut g = guild();
    let s = g.ws.member("S", &[g.sponsor]);
    let p = g.ws.member("P", &[]);
    let bot = Bot::new(&g.ws);

    bot.say(p, g.lobby, "!help").await.expect("handled");
    bot.say(s, g.lobby, "!HELP").await.expect("handled");
    let replies = bot.replies().await;
    assert!(replies[0].contains("!sponsor <family> <name>"));
    assert!(!replies[0].contains("[Sponsor only]"));
    assert!(replies[1].contains("[Sponsor only] !stales"));
    assert!(replies[1].contains("needs a d/h/m/s unit"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_commands_extend_a_saturated_family_once() {
    let mut g = guild();
    let callers: Vec<MemberId> = (0..6).map(|n| g.ws.member(&format!("P{n}"), &[])).collect();
    let alpha = g.ws.container("alpha 1", 1, &[g.container]);
    g.ws.fill(alpha, SPACES_PER_CONTAINER);
    let bot = Arc::new(Bot::new(&g.ws));

    let mut tasks = Vec::new();
    for (n, caller) in callers.into_iter().enumerate() {
        let bot = bot.clone();
        let lobby = g.lobby;
        tasks.push(tokio::spawn(async move {
            bot.say(caller, lobby, &format!("!sponsor alpha n{n}")).await
        }));
    }
    for task in tasks {
        task.await.expect("join").expect("handled");
    }

    let extensions: Vec<String> = bot
        .platform
        .channels()
        .await
        .expect("channels")
        .into_iter()
        .filter(|c| c.is_container() && c.name.starts_with("alpha"))
        .map(|c| c.name)
        .collect();
    assert_eq!(extensions, vec!["alpha 1".to_string(), "alpha 2".to_string()]);
}
