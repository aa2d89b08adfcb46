use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::{
    all::{
        CommandDataOptionValue, CommandInteraction, ComponentInteraction,
        ComponentInteractionCollector, Interaction, Member, Permissions, User,
    },
    builder::{
        CreateAutocompleteResponse, CreateInteractionResponse, CreateInteractionResponseFollowup,
        CreateInteractionResponseMessage, EditInteractionResponse,
    },
    model::id::{ChannelId, GuildId, MessageId, UserId},
    prelude::Context,
};
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};
use tracing::{debug, error, warn, Instrument};
use uuid::Uuid;

use crate::{
    audio::VoiceChannelInfo,
    interactions::{
        base::InteractionBase, AutocompleteChoice, AutocompleteParams, CommandOptions,
        ComponentParams, InteractionContext, InteractionRegistry, InteractionUser, OptionValue,
        PageCollector, Reply, Responder, SlashCommandParams,
    },
    locale::DEFAULT_LOCALE,
    ui::{buttons, buttons::button_ids, embeds},
    validation::{check_channel_permission_viewable, InteractionValidationError},
};

/// Routes interactions to their handlers and turns failures into replies.
pub struct Dispatcher {
    registry: InteractionRegistry,
    base: InteractionBase,
}

impl Dispatcher {
    pub fn new(registry: InteractionRegistry, base: InteractionBase) -> Self {
        Self { registry, base }
    }

    pub fn registry(&self) -> &InteractionRegistry {
        &self.registry
    }

    pub async fn command(
        &self,
        name: &str,
        interaction: &InteractionContext,
        options: &CommandOptions,
        responder: &dyn Responder,
    ) {
        let span = InteractionBase::span("commands", name, interaction);
        async {
            if let Err(e) = self.check_permissions(interaction) {
                return self.reply_validation_error(&e, interaction, responder).await;
            }

            let Some(command) = self.registry.slash_command(name) else {
                warn!("Interaction created but slash command '{}' was not found.", name);
                return self.reply_unknown(name, interaction, responder).await;
            };

            debug!("Executing slash command /{}", name);
            let result = command
                .execute(SlashCommandParams {
                    interaction,
                    options,
                    responder,
                })
                .await;
            self.finish(result, interaction, responder).await;
        }
        .instrument(span)
        .await
    }

    pub async fn component(
        &self,
        custom_id: &str,
        interaction: &InteractionContext,
        responder: &dyn Responder,
    ) {
        if button_ids::is_pagination(custom_id) {
            return;
        }

        let (name, reference_id) = buttons::parse_custom_id(custom_id);
        let span = InteractionBase::span("components", name, interaction);
        async {
            if let Err(e) = self.check_permissions(interaction) {
                return self.reply_validation_error(&e, interaction, responder).await;
            }

            let Some(component) = self.registry.component(name) else {
                warn!("Interaction created but component '{}' was not found.", name);
                return self.reply_unknown(name, interaction, responder).await;
            };

            debug!("Executing component {} (reference {:?})", name, reference_id);
            let result = component
                .execute(ComponentParams {
                    interaction,
                    reference_id,
                    responder,
                })
                .await;
            self.finish(result, interaction, responder).await;
        }
        .instrument(span)
        .await
    }

    pub async fn autocomplete(
        &self,
        name: &str,
        focused: &str,
        interaction: &InteractionContext,
        responder: &dyn Responder,
    ) {
        let span = InteractionBase::span("autocomplete", name, interaction);
        async {
            let Some(autocomplete) = self.registry.autocomplete(name) else {
                warn!("Interaction created but autocomplete '{}' was not found.", name);
                if let Err(e) = responder.autocomplete(Vec::new()).await {
                    warn!("⚠️ Failed to answer autocomplete: {:?}", e);
                }
                return;
            };

            if let Err(e) = autocomplete
                .execute(AutocompleteParams {
                    interaction,
                    focused,
                    responder,
                })
                .await
            {
                error!("❌ Autocomplete for /{} failed: {:?}", name, e);
            }
        }
        .instrument(span)
        .await
    }

    fn check_permissions(
        &self,
        interaction: &InteractionContext,
    ) -> Result<(), InteractionValidationError> {
        self.base
            .run_validators(interaction, None, &[check_channel_permission_viewable])
    }

    async fn finish(
        &self,
        result: Result<()>,
        interaction: &InteractionContext,
        responder: &dyn Responder,
    ) {
        let Err(e) = result else {
            return;
        };

        match e.downcast_ref::<InteractionValidationError>() {
            Some(validation) => {
                self.reply_validation_error(validation, interaction, responder)
                    .await
            }
            None => {
                error!("❌ Failed to handle interaction: {:?}", e);
                let options = &self.base.config().embed;
                let description = InteractionBase::translator(interaction)
                    .translate("errors.unexpected", &[("icon", &options.icons.error)]);
                send(
                    responder,
                    Reply::embed(embeds::error_embed(options, description)).ephemeral(),
                )
                .await;
            }
        }
    }

    async fn reply_validation_error(
        &self,
        e: &InteractionValidationError,
        interaction: &InteractionContext,
        responder: &dyn Responder,
    ) {
        let options = &self.base.config().embed;
        let description = e.render(
            &InteractionBase::translator(interaction),
            &options.icons.warning,
        );
        send(
            responder,
            Reply::embed(embeds::warning_embed(options, description)).ephemeral(),
        )
        .await;
    }

    async fn reply_unknown(
        &self,
        name: &str,
        interaction: &InteractionContext,
        responder: &dyn Responder,
    ) {
        let options = &self.base.config().embed;
        let description = InteractionBase::translator(interaction).translate(
            "errors.unknownInteraction",
            &[("icon", &options.icons.warning), ("name", name)],
        );
        send(
            responder,
            Reply::embed(embeds::warning_embed(options, description)).ephemeral(),
        )
        .await;
    }
}

async fn send(responder: &dyn Responder, reply: Reply) {
    if let Err(e) = responder.respond(reply).await {
        error!("❌ Failed to reply to interaction: {:?}", e);
    }
}

/// Builds the handler-facing context and responder, then dispatches.
pub async fn handle_interaction(dispatcher: &Dispatcher, ctx: Context, interaction: Interaction) {
    match interaction {
        Interaction::Command(command) => {
            let context = interaction_context(
                &ctx,
                command.guild_id,
                command.channel_id,
                &command.user,
                command.member.as_deref(),
                command.app_permissions,
            );
            let options = command_options(&command);
            let name = command.data.name.clone();
            let responder =
                SerenityResponder::new(ctx, ResponseTarget::Command(Box::new(command)));

            dispatcher
                .command(&name, &context, &options, &responder)
                .await;
        }
        Interaction::Component(component) => {
            let context = interaction_context(
                &ctx,
                component.guild_id,
                component.channel_id,
                &component.user,
                component.member.as_ref(),
                component.app_permissions,
            );
            let custom_id = component.data.custom_id.clone();
            let responder =
                SerenityResponder::new(ctx, ResponseTarget::Component(Box::new(component)));

            dispatcher.component(&custom_id, &context, &responder).await;
        }
        Interaction::Autocomplete(command) => {
            let context = interaction_context(
                &ctx,
                command.guild_id,
                command.channel_id,
                &command.user,
                command.member.as_deref(),
                command.app_permissions,
            );
            let name = command.data.name.clone();
            let focused = command
                .data
                .autocomplete()
                .map(|option| option.value.to_string())
                .unwrap_or_default();
            let responder =
                SerenityResponder::new(ctx, ResponseTarget::Command(Box::new(command)));

            dispatcher
                .autocomplete(&name, &focused, &context, &responder)
                .await;
        }
        _ => {}
    }
}

/// Snapshot of the guild state an interaction needs, read from the cache.
fn interaction_context(
    ctx: &Context,
    guild_id: Option<GuildId>,
    channel_id: ChannelId,
    user: &User,
    member: Option<&Member>,
    app_permissions: Option<Permissions>,
) -> InteractionContext {
    let bot_id = ctx.cache.current_user().id;
    let mut context = InteractionContext {
        execution_id: Uuid::new_v4().to_string(),
        guild_id,
        shard_id: ctx.shard_id.0,
        channel_id,
        user: InteractionUser {
            id: user.id,
            name: user.name.clone(),
            nickname: member.and_then(|member| member.nick.clone()),
            avatar_url: user.avatar_url(),
        },
        locale: DEFAULT_LOCALE.to_string(),
        user_voice_channel: None,
        bot_voice_channel: None,
        can_view_channel: app_permissions.is_none_or(|permissions| permissions.view_channel()),
        guild_icon_url: None,
    };

    if let Some(guild) = guild_id.and_then(|id| ctx.cache.guild(id)) {
        let voice_channel_of = |user_id: UserId| {
            guild
                .voice_states
                .get(&user_id)
                .and_then(|state| state.channel_id)
        };

        context.user_voice_channel = voice_channel_of(user.id).map(|id| {
            let channel = guild.channels.get(&id);
            VoiceChannelInfo {
                id,
                name: channel.map(|c| c.name.clone()).unwrap_or_default(),
                bitrate: channel.and_then(|c| c.bitrate),
            }
        });
        context.bot_voice_channel = voice_channel_of(bot_id);
        context.locale = guild.preferred_locale.clone();
        context.guild_icon_url = guild.icon_url();
    }

    context
}

fn command_options(command: &CommandInteraction) -> CommandOptions {
    command
        .data
        .options
        .iter()
        .fold(CommandOptions::default(), |options, option| match &option.value {
            CommandDataOptionValue::String(value) => {
                options.with(&option.name, OptionValue::String(value.clone()))
            }
            CommandDataOptionValue::Integer(value) => {
                options.with(&option.name, OptionValue::Integer(*value))
            }
            _ => options,
        })
}

#[derive(Clone)]
enum ResponseTarget {
    Command(Box<CommandInteraction>),
    Component(Box<ComponentInteraction>),
}

impl ResponseTarget {
    async fn create_response(&self, ctx: &Context, response: CreateInteractionResponse) -> Result<()> {
        match self {
            Self::Command(command) => command.create_response(&ctx.http, response).await?,
            Self::Component(component) => component.create_response(&ctx.http, response).await?,
        }
        Ok(())
    }

    async fn edit_response(&self, ctx: &Context, edit: EditInteractionResponse) -> Result<()> {
        match self {
            Self::Command(command) => command.edit_response(&ctx.http, edit).await?,
            Self::Component(component) => component.edit_response(&ctx.http, edit).await?,
        };
        Ok(())
    }

    async fn response_id(&self, ctx: &Context) -> Result<MessageId> {
        let message = match self {
            Self::Command(command) => command.get_response(&ctx.http).await?,
            Self::Component(component) => component.get_response(&ctx.http).await?,
        };
        Ok(message.id)
    }

    async fn delete_response(&self, ctx: &Context) -> Result<()> {
        match self {
            Self::Command(command) => command.delete_response(&ctx.http).await?,
            Self::Component(component) => component.delete_response(&ctx.http).await?,
        }
        Ok(())
    }

    fn user_id(&self) -> UserId {
        match self {
            Self::Command(command) => command.user.id,
            Self::Component(component) => component.user.id,
        }
    }
}

fn response_message(reply: Reply) -> CreateInteractionResponseMessage {
    CreateInteractionResponseMessage::new()
        .embeds(reply.embeds)
        .components(reply.components)
        .ephemeral(reply.ephemeral)
}

fn response_edit(reply: Reply) -> EditInteractionResponse {
    EditInteractionResponse::new()
        .embeds(reply.embeds)
        .components(reply.components)
}

/// [`Responder`] backed by a live serenity interaction.
pub struct SerenityResponder {
    ctx: Context,
    target: ResponseTarget,
    acknowledged: AtomicBool,
}

impl SerenityResponder {
    fn new(ctx: Context, target: ResponseTarget) -> Self {
        Self {
            ctx,
            target,
            acknowledged: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Responder for SerenityResponder {
    async fn defer(&self, ephemeral: bool) -> Result<()> {
        self.target
            .create_response(
                &self.ctx,
                CreateInteractionResponse::Defer(
                    CreateInteractionResponseMessage::new().ephemeral(ephemeral),
                ),
            )
            .await?;
        self.acknowledged.store(true, Ordering::Release);
        Ok(())
    }

    async fn respond(&self, reply: Reply) -> Result<()> {
        if self.acknowledged.load(Ordering::Acquire) {
            return self.target.edit_response(&self.ctx, response_edit(reply)).await;
        }

        self.target
            .create_response(&self.ctx, CreateInteractionResponse::Message(response_message(reply)))
            .await?;
        self.acknowledged.store(true, Ordering::Release);
        Ok(())
    }

    async fn respond_paged(
        &self,
        reply: Reply,
        inactivity: Duration,
    ) -> Result<Box<dyn PageCollector>> {
        self.respond(reply).await?;
        let message_id = self
            .target
            .response_id(&self.ctx)
            .await
            .context("paginated response has no message")?;

        Ok(Box::new(SerenityPageCollector {
            ctx: self.ctx.clone(),
            origin: self.target.clone(),
            message_id,
            user_id: self.target.user_id(),
            inactivity,
            press: None,
            press_answered: false,
        }))
    }

    async fn autocomplete(&self, choices: Vec<AutocompleteChoice>) -> Result<()> {
        let response = choices.into_iter().fold(
            CreateAutocompleteResponse::new(),
            |response, choice| response.add_string_choice(choice.name, choice.value),
        );

        self.target
            .create_response(&self.ctx, CreateInteractionResponse::Autocomplete(response))
            .await
    }
}

/// Presses on one paginated response, limited to the user who opened it.
struct SerenityPageCollector {
    ctx: Context,
    origin: ResponseTarget,
    message_id: MessageId,
    user_id: UserId,
    inactivity: Duration,
    press: Option<ComponentInteraction>,
    press_answered: bool,
}

impl SerenityPageCollector {
    fn press(&self) -> Result<&ComponentInteraction> {
        self.press.as_ref().context("no button press to answer")
    }
}

#[async_trait]
impl PageCollector for SerenityPageCollector {
    async fn next_press(&mut self) -> Option<String> {
        let press = ComponentInteractionCollector::new(&self.ctx.shard)
            .message_id(self.message_id)
            .author_id(self.user_id)
            .timeout(self.inactivity)
            .next()
            .await?;

        let custom_id = press.data.custom_id.clone();
        self.press = Some(press);
        self.press_answered = false;
        Some(custom_id)
    }

    async fn update(&mut self, reply: Reply) -> Result<()> {
        if self.press_answered {
            return self.origin.edit_response(&self.ctx, response_edit(reply)).await;
        }

        self.press()?
            .create_response(
                &self.ctx.http,
                CreateInteractionResponse::UpdateMessage(response_message(reply)),
            )
            .await?;
        self.press_answered = true;
        Ok(())
    }

    async fn notify(&mut self, reply: Reply) -> Result<()> {
        if self.press_answered {
            self.press()?
                .create_followup(
                    &self.ctx.http,
                    CreateInteractionResponseFollowup::new()
                        .embeds(reply.embeds)
                        .ephemeral(true),
                )
                .await?;
            return Ok(());
        }

        self.press()?
            .create_response(
                &self.ctx.http,
                CreateInteractionResponse::Message(response_message(reply.ephemeral())),
            )
            .await?;
        self.press_answered = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.origin.delete_response(&self.ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        interactions::{
            test_support::{description, sample_interaction, test_config},
            ComponentHandler, MockResponder, SlashCommand,
        },
    };
    use serenity::builder::CreateCommand;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    struct StubCommand {
        outcome: fn() -> Result<()>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SlashCommand for StubCommand {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn definition(&self) -> CreateCommand {
            CreateCommand::new("stub").description("Stub.")
        }

        async fn execute(&self, _params: SlashCommandParams<'_>) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    struct RecordingButton {
        references: Arc<Mutex<Vec<Option<String>>>>,
    }

    #[async_trait]
    impl ComponentHandler for RecordingButton {
        fn name(&self) -> &'static str {
            button_ids::SKIP
        }

        async fn execute(&self, params: ComponentParams<'_>) -> Result<()> {
            self.references
                .lock()
                .unwrap()
                .push(params.reference_id.map(str::to_string));
            Ok(())
        }
    }

    fn dispatcher_with(outcome: fn() -> Result<()>) -> (Dispatcher, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = InteractionRegistry::default();
        registry.register_command(Arc::new(StubCommand {
            outcome,
            calls: calls.clone(),
        }));
        (
            Dispatcher::new(registry, InteractionBase::new(test_config())),
            calls,
        )
    }

    fn expect_reply(responder: &mut MockResponder, needle: &'static str) {
        responder
            .expect_respond()
            .times(1)
            .withf(move |reply| reply.ephemeral && description(reply).contains(needle))
            .returning(|_| Ok(()));
    }

    #[tokio::test]
    async fn unknown_command_gets_a_notice() {
        let (dispatcher, calls) = dispatcher_with(|| Ok(()));
        let mut responder = MockResponder::new();
        expect_reply(&mut responder, "I don't know how to handle **`help`**");

        dispatcher
            .command("help", &sample_interaction(), &CommandOptions::default(), &responder)
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn validation_errors_become_warnings() {
        let (dispatcher, _) = dispatcher_with(|| {
            Err(InteractionValidationError::new("validation.notInVoiceChannel").into())
        });
        let mut responder = MockResponder::new();
        expect_reply(&mut responder, "Not in a voice channel");

        dispatcher
            .command("stub", &sample_interaction(), &CommandOptions::default(), &responder)
            .await;
    }

    #[tokio::test]
    async fn unexpected_errors_get_generic_reply() {
        let (dispatcher, _) = dispatcher_with(|| Err(anyhow::anyhow!("voice gateway closed")));
        let mut responder = MockResponder::new();
        expect_reply(&mut responder, "unexpected error");

        dispatcher
            .command("stub", &sample_interaction(), &CommandOptions::default(), &responder)
            .await;
    }

    #[tokio::test]
    async fn missing_view_permission_stops_before_handler() {
        let (dispatcher, calls) = dispatcher_with(|| Ok(()));
        let mut interaction = sample_interaction();
        interaction.can_view_channel = false;
        let mut responder = MockResponder::new();
        expect_reply(&mut responder, "Missing permission");

        dispatcher
            .command("stub", &interaction, &CommandOptions::default(), &responder)
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn components_receive_their_reference() {
        let references = Arc::new(Mutex::new(Vec::new()));
        let mut registry = InteractionRegistry::default();
        registry.register_component(Arc::new(RecordingButton {
            references: references.clone(),
        }));
        let dispatcher = Dispatcher::new(registry, InteractionBase::new(Arc::new(Config::default())));
        let mut responder = MockResponder::new();
        responder.expect_respond().never();

        dispatcher
            .component("action-skip-button_abc", &sample_interaction(), &responder)
            .await;
        dispatcher
            .component("action-skip-button", &sample_interaction(), &responder)
            .await;

        assert_eq!(
            *references.lock().unwrap(),
            vec![Some("abc".to_string()), None]
        );
    }

    #[tokio::test]
    async fn page_buttons_are_left_to_the_collector() {
        let dispatcher = Dispatcher::new(
            InteractionRegistry::default(),
            InteractionBase::new(test_config()),
        );
        let mut responder = MockResponder::new();
        responder.expect_respond().never();

        for custom_id in [button_ids::PREVIOUS_PAGE, button_ids::NEXT_PAGE] {
            dispatcher
                .component(custom_id, &sample_interaction(), &responder)
                .await;
        }
    }

    #[tokio::test]
    async fn unknown_autocomplete_answers_empty() {
        let dispatcher = Dispatcher::new(
            InteractionRegistry::default(),
            InteractionBase::new(test_config()),
        );
        let mut responder = MockResponder::new();
        responder
            .expect_autocomplete()
            .times(1)
            .withf(|choices| choices.is_empty())
            .returning(|_| Ok(()));

        dispatcher
            .autocomplete("play", "lofi", &sample_interaction(), &responder)
            .await;
    }
}
