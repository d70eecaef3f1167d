/// Pipeline - Vulkan graphics pipeline and its layout

use ash::vk;
use quad_engine::quad::{Error, Result};
use quad_engine::quad::render::{PipelineDesc, VertexLayout};
use quad_engine::{engine_bail_warn, engine_err};
use std::io::Cursor;

use crate::vulkan_format::{check, format_to_vk};

/// Vulkan graphics pipeline
///
/// The layout has no descriptor sets and no push constants; the quad is drawn
/// from vertex attributes alone.
pub struct Pipeline {
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) layout: vk::PipelineLayout,
}

impl Pipeline {
    /// Build the fixed triangle-list pipeline for `desc.render_pass`
    ///
    /// Back faces are culled with clockwise front faces, blending is off, and
    /// viewport and scissor are dynamic so rebuilds never touch the pipeline.
    pub(crate) unsafe fn create(device: &ash::Device, desc: &PipelineDesc<'_>, render_pass: vk::RenderPass) -> Result<Self> {
        let vertex_module = create_shader_module(device, desc.vertex_shader, "vertex")?;
        let fragment_module = match create_shader_module(device, desc.fragment_shader, "fragment") {
            Ok(module) => module,
            Err(e) => {
                device.destroy_shader_module(vertex_module, None);
                return Err(e);
            }
        };

        let result = Self::create_with_modules(device, desc, render_pass, vertex_module, fragment_module);

        // Modules are only needed while the pipeline is created
        device.destroy_shader_module(fragment_module, None);
        device.destroy_shader_module(vertex_module, None);

        result
    }

    unsafe fn create_with_modules(
        device: &ash::Device,
        desc: &PipelineDesc<'_>,
        render_pass: vk::RenderPass,
        vertex_module: vk::ShaderModule,
        fragment_module: vk::ShaderModule,
    ) -> Result<Self> {
        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_module)
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_module)
                .name(c"main"),
        ];

        let (vertex_bindings, vertex_attributes) = vertex_input(&desc.vertex_layout);
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // Viewport state (dynamic)
        let viewports = [vk::Viewport::default()];
        let scissors = [vk::Rect2D::default()];
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::CLOCKWISE)
            .depth_bias_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false);

        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(std::slice::from_ref(&color_blend_attachment));

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default()
            .dynamic_states(&dynamic_states);

        let layout_create_info = vk::PipelineLayoutCreateInfo::default();
        let layout = check("create pipeline layout", device.create_pipeline_layout(&layout_create_info, None))?;

        let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass)
            .subpass(0);

        let pipelines = match device.create_graphics_pipelines(
            vk::PipelineCache::null(),
            &[pipeline_create_info],
            None,
        ) {
            Ok(pipelines) => pipelines,
            Err((_, e)) => {
                device.destroy_pipeline_layout(layout, None);
                return Err(engine_err!("quad::vulkan", "Failed to create graphics pipeline: {:?}", e));
            }
        };

        match pipelines.first() {
            Some(&pipeline) => Ok(Self { pipeline, layout }),
            None => {
                device.destroy_pipeline_layout(layout, None);
                Err(Error::BackendError("driver returned no pipeline".to_string()))
            }
        }
    }

    pub(crate) unsafe fn destroy(self, device: &ash::Device) {
        device.destroy_pipeline(self.pipeline, None);
        device.destroy_pipeline_layout(self.layout, None);
    }
}

/// Single per-vertex binding 0 with the layout's attributes
fn vertex_input(
    layout: &VertexLayout,
) -> ([vk::VertexInputBindingDescription; 1], Vec<vk::VertexInputAttributeDescription>) {
    let binding = vk::VertexInputBindingDescription {
        binding: 0,
        stride: layout.stride,
        input_rate: vk::VertexInputRate::VERTEX,
    };

    let attributes = layout
        .attributes
        .iter()
        .map(|attribute| vk::VertexInputAttributeDescription {
            location: attribute.location,
            binding: 0,
            format: format_to_vk(attribute.format),
            offset: attribute.offset,
        })
        .collect();

    ([binding], attributes)
}

unsafe fn create_shader_module(device: &ash::Device, code: &[u8], stage: &str) -> Result<vk::ShaderModule> {
    // read_spv copies into aligned u32 words and checks the length
    let words = match ash::util::read_spv(&mut Cursor::new(code)) {
        Ok(words) => words,
        Err(e) => engine_bail_warn!("quad::vulkan", "Invalid {} shader SPIR-V: {}", stage, e),
    };

    let create_info = vk::ShaderModuleCreateInfo::default().code(&words);
    check("create shader module", device.create_shader_module(&create_info, None))
}
